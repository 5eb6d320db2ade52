//! Observable state of the image upload widget.

/// Progress and error of the current (or last) upload.
///
/// `progress` is `Some` only while a transfer is running; the trigger is
/// disabled for that whole window.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UploadState {
    pub progress: Option<u8>,
    pub error: Option<String>,
}

impl UploadState {
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.progress.is_some()
    }

    /// Text for the upload trigger.
    #[must_use]
    pub fn button_label(&self) -> String {
        match self.progress {
            Some(percent) => format!("{percent}%"),
            None => "Upload Image".to_owned(),
        }
    }
}
