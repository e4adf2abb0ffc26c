/// User-visible notification raised by the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    MissingInformation,
    Welcome,
    LoginFailed,
    InvalidFileType,
    UserIdNotFound,
    ImageUploaded,
    UploadFailed,
    MissingAnalysisData,
    AnalysisFailed,
    AnalysisError,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Info,
    Error,
}

impl Notification {
    pub fn severity(self) -> Severity {
        match self {
            Notification::Welcome | Notification::ImageUploaded => Severity::Info,
            _ => Severity::Error,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Notification::MissingInformation => "Missing Information",
            Notification::Welcome => "Welcome!",
            Notification::LoginFailed => "Login Failed",
            Notification::InvalidFileType => "Invalid File Type",
            Notification::ImageUploaded => "Image Uploaded!",
            Notification::UploadFailed => "Upload Failed",
            Notification::AnalysisFailed => "Analysis Failed",
            Notification::UserIdNotFound
            | Notification::MissingAnalysisData
            | Notification::AnalysisError => "Error",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Notification::MissingInformation => "Please enter both name and email.",
            Notification::Welcome => "Successfully logged in to your wellness journey.",
            Notification::LoginFailed => "Unable to create your account. Please try again.",
            Notification::InvalidFileType => "Please select a JPG, JPEG, or PNG image.",
            Notification::UserIdNotFound => "User ID not found. Please log in again.",
            Notification::ImageUploaded => "Analyzing your meal... This may take a moment.",
            Notification::UploadFailed | Notification::AnalysisFailed => {
                "Unable to analyze your meal. Please try again."
            }
            Notification::MissingAnalysisData => "Missing analysis data. Please try again.",
            Notification::AnalysisError => "Something went wrong during analysis.",
        }
    }
}
