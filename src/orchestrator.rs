//! Pipeline orchestrator for Ferd.
//!
//! Coordinates the entire run: extract the export, load metadata, resolve
//! voice references and story-beat summaries once, then process clips
//! strictly one at a time. Failures are trapped per clip; a single bad clip
//! never aborts the batch.

use std::collections::BTreeMap;
use std::path::Path;

use tracing::{info, instrument, warn};

use crate::analysis::{
    format_traveler, summarize_beats, AnalysisResponse, Analyzer, AudioAnalyzer, ClipAnalysis,
    GeminiClient,
};
use crate::cli::Output;
use crate::config::Settings;
use crate::context::{build_context, AnalysisContext, SummaryLookup};
use crate::error::{FerdError, Result};
use crate::export::{
    extract_zip, Clip, Document, ResolvedStoryBeat, StoryBeatLookup, ENRICHED_FILENAME,
    METADATA_FILENAME,
};
use crate::transcription::{DiarizedTranscriber, Transcriber, TranscriptEntry};
use crate::voice::{self, VoiceReference};

/// Per-run execution flags.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Echo full transcripts for each clip.
    pub verbose: bool,
    /// Perform all local work but skip every external network call.
    pub dry_run: bool,
    /// Route transcripts through the diarizing transcription model instead
    /// of the analysis model.
    pub hybrid: bool,
}

/// Statistics accumulated over one run. Counts only increase.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcessingStats {
    pub processed_count: usize,
    pub error_count: usize,
    pub audio_type_counts: BTreeMap<String, usize>,
    pub total_utterances: usize,
    pub total_audio_events: usize,
    pub clips_with_story_beats: usize,
}

impl ProcessingStats {
    fn record_success(&mut self, analysis: &ClipAnalysis, has_story_beat: bool) {
        self.processed_count += 1;
        *self
            .audio_type_counts
            .entry(analysis.audio_type.to_string())
            .or_insert(0) += 1;
        self.total_utterances += analysis.transcript.len();
        self.total_audio_events += analysis.audio_events.len();
        if has_story_beat {
            self.clips_with_story_beats += 1;
        }
    }

    fn record_failure(&mut self) {
        self.error_count += 1;
    }
}

/// Merge one clip's model outputs into the persisted annotation.
///
/// In hybrid mode the diarized transcript is authoritative and replaces the
/// analysis model's own transcript; every other field always comes from the
/// analysis model. Side-channel metadata never passes through here.
pub fn merge_analysis(
    analysis: ClipAnalysis,
    transcript_override: Option<Vec<TranscriptEntry>>,
) -> ClipAnalysis {
    match transcript_override {
        Some(transcript) => ClipAnalysis {
            transcript,
            ..analysis
        },
        None => analysis,
    }
}

/// The resolved story-beat copy persisted on a clip record.
fn resolve_story_beat(
    clip: &Clip,
    story_beats: &StoryBeatLookup,
    summaries: &SummaryLookup,
) -> Option<ResolvedStoryBeat> {
    let id = clip.story_beat_id.as_ref()?;
    let beat = story_beats.get(id)?;
    let summary = summaries
        .get(id)
        .filter(|summary| summary.as_str() != beat.text)
        .cloned();

    Some(ResolvedStoryBeat {
        id: id.clone(),
        text: beat.text.clone(),
        starred: beat.starred,
        summary,
    })
}

/// The main orchestrator for the Ferd pipeline.
pub struct Orchestrator {
    settings: Settings,
    gemini: Option<GeminiClient>,
    analyzer: Option<Box<dyn Analyzer>>,
    transcriber: Option<Box<dyn Transcriber>>,
}

impl Orchestrator {
    /// Create an orchestrator, picking up API keys from the environment.
    ///
    /// Missing keys are not an error here: dry runs need neither, and
    /// preflight checks gate the modes that do.
    pub fn new(settings: Settings) -> Result<Self> {
        let gemini = std::env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(|key| GeminiClient::new(&key, &settings.analysis.model))
            .transpose()?;

        let analyzer = gemini.clone().map(|client| {
            Box::new(AudioAnalyzer::new(client, &settings.analysis.audio_mime_type))
                as Box<dyn Analyzer>
        });

        let transcriber = std::env::var("OPENAI_API_KEY")
            .ok()
            .filter(|key| !key.is_empty())
            .map(|key| {
                DiarizedTranscriber::new(&key, &settings.transcription.model)
                    .map(|t| Box::new(t) as Box<dyn Transcriber>)
            })
            .transpose()?;

        Ok(Self {
            settings,
            gemini,
            analyzer,
            transcriber,
        })
    }

    /// Create an orchestrator with custom components.
    pub fn with_components(
        settings: Settings,
        gemini: Option<GeminiClient>,
        analyzer: Option<Box<dyn Analyzer>>,
        transcriber: Option<Box<dyn Transcriber>>,
    ) -> Self {
        Self {
            settings,
            gemini,
            analyzer,
            transcriber,
        }
    }

    /// Process one export ZIP end to end. Returns the run statistics.
    #[instrument(skip(self), fields(zip_path = %zip_path.display()))]
    pub async fn process_export(&self, zip_path: &Path, options: RunOptions) -> Result<ProcessingStats> {
        let output_dir = self.settings.output_dir();
        let root = extract_zip(zip_path, &output_dir)?;
        let mut document = Document::load(&root.join(METADATA_FILENAME))?;

        print_trip_summary(&document);

        let travelers = document.traveler_roster();
        let story_beats = document.story_beat_lookup();

        // One-time setup before the clip loop: voice references and beat
        // summaries are per-run, not per-clip.
        let references = voice::resolve(&root, &travelers);
        voice::warn_if_legacy_only(&root, &references);
        Output::info(&voice::coverage(&travelers, &references).summary());

        let summaries = if options.dry_run || story_beats.is_empty() {
            SummaryLookup::new()
        } else {
            let gemini = self.require_gemini()?;
            info!("Summarizing {} story beats", story_beats.len());
            summarize_beats(gemini, &story_beats).await
        };

        Output::header("Processing Clips");

        let mut stats = ProcessingStats::default();
        let total = document.clips.len();

        for (idx, clip) in document.clips.iter_mut().enumerate() {
            let percentage = (idx + 1) * 100 / total.max(1);
            eprintln!(
                "\nProcessing clip {}/{} ({}%): {}",
                idx + 1,
                total,
                percentage,
                clip.file_name()
            );

            let context = build_context(clip, &travelers, Some(&story_beats), Some(&summaries));
            let story_beat = resolve_story_beat(clip, &story_beats, &summaries);

            let outcome = self
                .process_single_clip(clip, &root, context, story_beat, &references, &options, &mut stats)
                .await;

            // The per-clip error boundary: record and keep going.
            if let Err(e) = outcome {
                eprintln!("  Error: {}", e);
                clip.set_analysis_failure(e.to_string());
                stats.record_failure();
            }
        }

        if !options.dry_run {
            Output::header("Saving Results");
            document.save(&output_dir.join(ENRICHED_FILENAME))?;
            Output::success(&format!(
                "Enriched metadata written to {}",
                output_dir.join(ENRICHED_FILENAME).display()
            ));
        }

        print_final_summary(&stats, total, options.dry_run);
        Ok(stats)
    }

    /// Process a single clip: locate audio, transcribe (hybrid), analyze,
    /// merge, annotate the record, update stats.
    #[allow(clippy::too_many_arguments)]
    async fn process_single_clip(
        &self,
        clip: &mut Clip,
        root: &Path,
        context: AnalysisContext,
        story_beat: Option<ResolvedStoryBeat>,
        references: &[VoiceReference],
        options: &RunOptions,
        stats: &mut ProcessingStats,
    ) -> Result<()> {
        let audio_path = root.join(clip.file_name());
        if !audio_path.exists() {
            return Err(FerdError::AudioNotFound(audio_path.display().to_string()));
        }

        if options.dry_run {
            eprintln!("  [DRY RUN] Would analyze: {}", audio_path.display());
            eprintln!(
                "  [DRY RUN] Context: {} travelers, location: {}",
                context.travelers.len(),
                context.location.as_deref().unwrap_or("N/A")
            );
            if options.hybrid && !references.is_empty() {
                let names: Vec<&str> =
                    references.iter().map(|r| r.traveler.name.as_str()).collect();
                eprintln!("  [DRY RUN] Voice references: {}", names.join(", "));
            }
            return Ok(());
        }

        clip.story_beat = story_beat;

        let transcript_override = if options.hybrid {
            let transcriber = self.transcriber.as_deref().ok_or_else(|| {
                FerdError::Config("OPENAI_API_KEY not set (required for --hybrid)".to_string())
            })?;
            let result = transcriber.transcribe(&audio_path, references).await?;
            Some(result.transcript)
        } else {
            None
        };

        let analyzer = self.analyzer.as_deref().ok_or_else(|| {
            FerdError::Config(
                "GEMINI_API_KEY not set. Set it with: export GEMINI_API_KEY='...'".to_string(),
            )
        })?;
        let response = analyzer.analyze(&audio_path, &context).await?;

        match response {
            AnalysisResponse::Parsed { analysis, .. } => {
                let merged = merge_analysis(analysis, transcript_override);

                eprintln!(
                    "  {}, {} utterances, {} audio events",
                    merged.audio_type,
                    merged.transcript.len(),
                    merged.audio_events.len()
                );

                if options.verbose && !merged.transcript.is_empty() {
                    eprintln!("\n  Transcript:");
                    for entry in &merged.transcript {
                        eprintln!("    [{}] {}: {}", entry.timestamp, entry.speaker, entry.text);
                    }
                }

                stats.record_success(&merged, context.has_story_beat());
                clip.set_analysis(merged);
            }
            AnalysisResponse::Malformed { error, .. } => {
                warn!("Analysis returned unparseable output: {}", error);
                eprintln!("  Analysis failed: {}", error);
                clip.set_analysis_failure(error);
                stats.record_failure();
            }
        }

        Ok(())
    }

    fn require_gemini(&self) -> Result<&GeminiClient> {
        self.gemini.as_ref().ok_or_else(|| {
            FerdError::Config(
                "GEMINI_API_KEY not set. Set it with: export GEMINI_API_KEY='...'".to_string(),
            )
        })
    }
}

fn print_trip_summary(document: &Document) {
    Output::header("Trip Summary");
    Output::kv("Trip Name", document.trip_name());

    if let Some(trip) = &document.trip {
        if let Some(id) = &trip.id {
            Output::kv("Trip ID", id);
        }
        if let Some(exported_at) = &trip.exported_at {
            Output::kv("Exported At", exported_at);
        }
    }

    Output::kv("Number of Clips", &document.clips.len().to_string());

    let travelers = document.traveler_roster();
    if travelers.is_empty() {
        Output::kv("Travelers", "None specified");
    } else {
        println!("  Travelers:");
        for traveler in &travelers {
            Output::list_item(&format_traveler(traveler));
        }
    }
}

fn print_final_summary(stats: &ProcessingStats, total: usize, dry_run: bool) {
    Output::header("Summary");

    if dry_run {
        Output::success(&format!("Dry run complete! Would process {} clips", total));
        return;
    }

    Output::success(&format!(
        "Done! Processed {}/{} clips successfully",
        stats.processed_count, total
    ));
    if stats.error_count > 0 {
        Output::warning(&format!("Errors: {} clips failed", stats.error_count));
    }

    if !stats.audio_type_counts.is_empty() {
        let breakdown: Vec<String> = stats
            .audio_type_counts
            .iter()
            .map(|(audio_type, count)| format!("{} {}", count, audio_type))
            .collect();
        Output::kv("Audio types", &breakdown.join(", "));
    }

    Output::kv(
        "Totals",
        &format!(
            "{} utterances transcribed, {} audio events detected",
            stats.total_utterances, stats.total_audio_events
        ),
    );
    if stats.clips_with_story_beats > 0 {
        Output::kv(
            "Story beats",
            &format!("{} clips carried story-beat context", stats.clips_with_story_beats),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AudioEvent, AudioType};
    use crate::export::StoryBeat;
    use std::io::Write;

    fn sample_analysis() -> ClipAnalysis {
        ClipAnalysis {
            audio_type: AudioType::Speech,
            transcript: vec![
                TranscriptEntry {
                    timestamp: "00:00".to_string(),
                    speaker: "Model Speaker".to_string(),
                    text: "from the analysis model".to_string(),
                },
            ],
            audio_events: vec![AudioEvent {
                timestamp: "00:01".to_string(),
                event: "rushing water".to_string(),
            }],
            scene_description: "A waterfall".to_string(),
            emotional_tone: "excited".to_string(),
        }
    }

    #[test]
    fn test_merge_without_override_keeps_model_transcript() {
        let merged = merge_analysis(sample_analysis(), None);
        assert_eq!(merged.transcript[0].speaker, "Model Speaker");
    }

    #[test]
    fn test_merge_hybrid_overrides_transcript_only() {
        let diarized = vec![TranscriptEntry {
            timestamp: "00:00".to_string(),
            speaker: "Ellen".to_string(),
            text: "from the diarizer".to_string(),
        }];

        let merged = merge_analysis(sample_analysis(), Some(diarized));
        assert_eq!(merged.transcript[0].speaker, "Ellen");
        // All non-transcript fields still come from the analysis model.
        assert_eq!(merged.audio_type, AudioType::Speech);
        assert_eq!(merged.scene_description, "A waterfall");
        assert_eq!(merged.audio_events.len(), 1);
    }

    #[test]
    fn test_stats_accumulate() {
        let mut stats = ProcessingStats::default();
        stats.record_success(&sample_analysis(), true);
        stats.record_success(&sample_analysis(), false);
        stats.record_failure();

        assert_eq!(stats.processed_count, 2);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.audio_type_counts["speech"], 2);
        assert_eq!(stats.total_utterances, 2);
        assert_eq!(stats.total_audio_events, 2);
        assert_eq!(stats.clips_with_story_beats, 1);
    }

    #[test]
    fn test_resolve_story_beat_includes_distinct_summary() {
        let clip: Clip =
            serde_json::from_str(r#"{"filename": "a.webm", "storyBeatId": "beat_1"}"#).unwrap();

        let mut lookup = StoryBeatLookup::new();
        lookup.insert(
            "beat_1".to_string(),
            StoryBeat {
                id: Some("beat_1".to_string()),
                text: "The full story text".to_string(),
                starred: true,
                extra: serde_json::Map::new(),
            },
        );

        let mut summaries = SummaryLookup::new();
        summaries.insert("beat_1".to_string(), "Short version.".to_string());

        let resolved = resolve_story_beat(&clip, &lookup, &summaries).unwrap();
        assert_eq!(resolved.id, "beat_1");
        assert!(resolved.starred);
        assert_eq!(resolved.summary.as_deref(), Some("Short version."));

        // A summary identical to the text (the short-text bypass) is not
        // duplicated onto the record.
        summaries.insert("beat_1".to_string(), "The full story text".to_string());
        let resolved = resolve_story_beat(&clip, &lookup, &summaries).unwrap();
        assert!(resolved.summary.is_none());
    }

    #[test]
    fn test_resolve_story_beat_unresolved_id() {
        let clip: Clip =
            serde_json::from_str(r#"{"filename": "a.webm", "storyBeatId": "missing"}"#).unwrap();
        assert!(resolve_story_beat(&clip, &StoryBeatLookup::new(), &SummaryLookup::new()).is_none());
    }

    fn write_export_zip(zip_path: &Path, metadata: &str, audio_files: &[&str]) {
        let file = std::fs::File::create(zip_path).unwrap();
        let mut writer = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();

        writer.start_file("export/metadata.json", options).unwrap();
        writer.write_all(metadata.as_bytes()).unwrap();

        for name in audio_files {
            writer.start_file(format!("export/{name}"), options).unwrap();
            writer.write_all(b"fake audio").unwrap();
        }
        writer.finish().unwrap();
    }

    #[tokio::test]
    async fn test_dry_run_touches_no_network_and_counts_missing_audio() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("export.zip");

        write_export_zip(
            &zip_path,
            r#"{
                "trip": {"name": "Test Trip", "talent": [{"name": "Alice", "age": 9}]},
                "clips": [
                    {"filename": "audio/clip_001.webm",
                     "location": {"placeName": "Golden Gate Bridge"}},
                    {"filename": "audio/clip_missing.webm"}
                ]
            }"#,
            &["audio/clip_001.webm"],
        );

        let mut settings = Settings::default();
        settings.general.output_dir = dir.path().join("out").display().to_string();

        // No clients: a dry run must not need them.
        let orchestrator = Orchestrator::with_components(settings, None, None, None);
        let options = RunOptions {
            dry_run: true,
            ..RunOptions::default()
        };

        let stats = orchestrator.process_export(&zip_path, options).await.unwrap();

        // Clip 1 would be analyzed; clip 2's audio is missing from the
        // export, which is an error even in a dry run.
        assert_eq!(stats.processed_count, 0);
        assert_eq!(stats.error_count, 1);

        // Dry runs never write the enriched document.
        assert!(!dir.path().join("out").join(ENRICHED_FILENAME).exists());
    }

    /// Test analyzer that returns a canned response.
    struct CannedAnalyzer {
        response: ClipAnalysis,
    }

    #[async_trait::async_trait]
    impl crate::analysis::Analyzer for CannedAnalyzer {
        async fn analyze(
            &self,
            _audio_path: &Path,
            _context: &crate::context::AnalysisContext,
        ) -> crate::error::Result<AnalysisResponse> {
            Ok(AnalysisResponse::Parsed {
                analysis: self.response.clone(),
                meta: crate::analysis::AnalysisMeta {
                    prompt: String::new(),
                    context: crate::context::AnalysisContext::with_travelers(vec![]),
                    raw_response: None,
                },
            })
        }
    }

    #[tokio::test]
    async fn test_one_failing_clip_does_not_abort_the_batch() {
        let dir = tempfile::tempdir().unwrap();
        let zip_path = dir.path().join("export.zip");

        // Clip 1's audio file is missing from the export (a hard per-clip
        // error); clip 2 analyzes fine.
        write_export_zip(
            &zip_path,
            r#"{
                "trip": {"name": "Test Trip"},
                "clips": [
                    {"filename": "audio/clip_gone.webm"},
                    {"filename": "audio/clip_002.webm"}
                ]
            }"#,
            &["audio/clip_002.webm"],
        );

        let mut settings = Settings::default();
        settings.general.output_dir = dir.path().join("out").display().to_string();
        let output_dir = settings.output_dir();

        let analyzer = Box::new(CannedAnalyzer {
            response: sample_analysis(),
        });
        let orchestrator = Orchestrator::with_components(settings, None, Some(analyzer), None);

        let stats = orchestrator
            .process_export(&zip_path, RunOptions::default())
            .await
            .unwrap();

        assert_eq!(stats.processed_count, 1);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.audio_type_counts["speech"], 1);
        assert_eq!(stats.total_utterances, 1);

        // The enriched document records the failure on clip 1 and the
        // annotation on clip 2, with no side-channel metadata anywhere.
        let enriched: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(output_dir.join(ENRICHED_FILENAME)).unwrap(),
        )
        .unwrap();

        let clips = enriched["clips"].as_array().unwrap();
        assert!(clips[0]["analysis"].is_null());
        assert!(!clips[0]["analysisError"].as_str().unwrap().is_empty());

        let analysis = &clips[1]["analysis"];
        assert_eq!(analysis["audioType"], "speech");
        assert_eq!(analysis["sceneDescription"], "A waterfall");
        assert!(clips[1].get("analysisError").is_none());
        assert!(analysis.get("_meta").is_none());
        assert!(analysis.get("prompt").is_none());
    }

    #[tokio::test]
    async fn test_missing_archive_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let orchestrator = Orchestrator::with_components(Settings::default(), None, None, None);

        let result = orchestrator
            .process_export(&dir.path().join("nope.zip"), RunOptions::default())
            .await;
        assert!(matches!(result, Err(FerdError::Archive(_))));
    }
}
