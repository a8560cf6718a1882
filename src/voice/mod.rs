//! Voice reference resolution.
//!
//! Travelers may carry a `voiceReferenceFile` pointing at a short sample of
//! them speaking inside the export. Resolution pairs each traveler with an
//! existing file; travelers without a reference, or whose file is missing
//! from the export, are skipped silently. Partial coverage is expected, not
//! an error.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::export::Traveler;

/// Fixed filename of the legacy single shared reference at the export root.
pub const LEGACY_REFERENCE_FILENAME: &str = "voice_reference.webm";

/// A traveler paired with a resolved, existing voice-sample file.
#[derive(Debug, Clone, PartialEq)]
pub struct VoiceReference {
    pub traveler: Traveler,
    pub file_path: PathBuf,
}

/// Resolve per-traveler voice references against the export root,
/// preserving traveler order.
pub fn resolve(extracted_root: &Path, travelers: &[Traveler]) -> Vec<VoiceReference> {
    travelers
        .iter()
        .filter_map(|traveler| {
            let relative = traveler.voice_reference_file.as_deref()?;
            let file_path = extracted_root.join(relative);

            if !file_path.exists() {
                debug!(
                    "Voice reference for {} not found at {}, skipping",
                    traveler.name,
                    file_path.display()
                );
                return None;
            }

            Some(VoiceReference {
                traveler: traveler.clone(),
                file_path,
            })
        })
        .collect()
}

/// Whether the export carries the legacy single shared reference file.
///
/// The legacy format is detected for operator visibility only; it is not
/// supported as an audio source in this version and must never be used as a
/// fallback.
pub fn legacy_reference_present(extracted_root: &Path) -> bool {
    extracted_root.join(LEGACY_REFERENCE_FILENAME).exists()
}

/// Warn when the export only offers the unsupported legacy format.
pub fn warn_if_legacy_only(extracted_root: &Path, resolved: &[VoiceReference]) {
    if resolved.is_empty() && legacy_reference_present(extracted_root) {
        warn!(
            "Legacy voice reference format detected ({}); this version only supports \
             per-traveler voice references and will transcribe without speaker hints",
            LEGACY_REFERENCE_FILENAME
        );
    }
}

/// Which travelers have voice references and which are missing them.
#[derive(Debug, Clone, PartialEq)]
pub struct Coverage {
    pub with_references: Vec<String>,
    pub missing: Vec<String>,
}

/// Compute reference coverage over the full traveler list.
pub fn coverage(travelers: &[Traveler], resolved: &[VoiceReference]) -> Coverage {
    let mut with_references = Vec::new();
    let mut missing = Vec::new();

    for traveler in travelers {
        let has_reference = resolved.iter().any(|r| &r.traveler == traveler);
        if has_reference {
            with_references.push(traveler.name.clone());
        } else {
            missing.push(traveler.name.clone());
        }
    }

    Coverage {
        with_references,
        missing,
    }
}

impl Coverage {
    /// One-line operator summary, distinguishable for the empty cases.
    pub fn summary(&self) -> String {
        if self.with_references.is_empty() && self.missing.is_empty() {
            return "No travelers listed in this export".to_string();
        }

        if self.with_references.is_empty() {
            return format!(
                "No voice references found (missing for: {})",
                self.missing.join(", ")
            );
        }

        let mut summary = format!("Voice references for: {}", self.with_references.join(", "));
        if !self.missing.is_empty() {
            summary.push_str(&format!("; missing for: {}", self.missing.join(", ")));
        }
        summary
    }
}
