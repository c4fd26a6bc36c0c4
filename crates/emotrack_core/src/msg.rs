#[derive(Debug, Clone, PartialEq)]
pub enum Msg {
    /// User chose a chat archive; any previous job is discarded.
    FileChosen(crate::ChatUpload),
    /// User asked to analyze the chosen file.
    SubmitClicked,
    /// Job-creation endpoint accepted the upload.
    Submitted { job_id: crate::JobId },
    /// Job-creation failed; `detail` is the server message when it sent one.
    SubmitFailed { detail: Option<String> },
    /// A status poll for `job_id` returned.
    StatusReceived {
        job_id: crate::JobId,
        report: crate::StatusReport,
    },
    /// A status poll for `job_id` failed in transport or with an error status.
    PollFailed {
        job_id: crate::JobId,
        detail: Option<String>,
    },
}
