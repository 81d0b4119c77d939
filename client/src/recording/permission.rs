/// Microphone authorization as reported by the OS
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum PermissionStatus {
    Authorized,
    Denied,
    Restricted,
    NotDetermined,
    Unknown,
}

/// Access to the OS microphone permission.
pub trait MicrophoneAccess: Send {
    fn status(&self) -> PermissionStatus;

    /// Ask for access, showing the native prompt if needed. Blocks until the
    /// user answers.
    fn request(&self) -> bool;
}

/// The host operating system's permission API.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemMicrophone;

impl MicrophoneAccess for SystemMicrophone {
    fn status(&self) -> PermissionStatus {
        #[cfg(target_os = "macos")]
        {
            use objc2_av_foundation::{AVAuthorizationStatus, AVCaptureDevice, AVMediaTypeAudio};

            // Safety: AVMediaTypeAudio is an extern static that must be accessed in unsafe block
            let media_type = match unsafe { AVMediaTypeAudio } {
                Some(mt) => mt,
                None => return PermissionStatus::Unknown,
            };

            // Safety: media_type is a valid NSString reference
            let status = unsafe { AVCaptureDevice::authorizationStatusForMediaType(media_type) };

            match status {
                AVAuthorizationStatus::Authorized => PermissionStatus::Authorized,
                AVAuthorizationStatus::Denied => PermissionStatus::Denied,
                AVAuthorizationStatus::Restricted => PermissionStatus::Restricted,
                AVAuthorizationStatus::NotDetermined => PermissionStatus::NotDetermined,
                _ => PermissionStatus::Unknown,
            }
        }
        #[cfg(not(target_os = "macos"))]
        {
            PermissionStatus::Authorized // Other platforms don't gate the microphone
        }
    }

    fn request(&self) -> bool {
        #[cfg(target_os = "macos")]
        {
            use objc2::runtime::Bool;
            use objc2_av_foundation::{AVCaptureDevice, AVMediaTypeAudio};
            use std::sync::mpsc;

            match self.status() {
                PermissionStatus::Authorized => return true,
                PermissionStatus::Denied | PermissionStatus::Restricted => return false,
                _ => {}
            }

            // Safety: AVMediaTypeAudio is an extern static that must be accessed in unsafe block
            let media_type = match unsafe { AVMediaTypeAudio } {
                Some(mt) => mt,
                None => return false,
            };

            let (tx, rx) = mpsc::channel::<bool>();

            // Safety: media_type is a valid NSString reference
            // This will trigger the native permission dialog if not yet determined
            unsafe {
                let block = block2::RcBlock::new(move |granted: Bool| {
                    let _ = tx.send(granted.as_bool());
                });
                AVCaptureDevice::requestAccessForMediaType_completionHandler(media_type, &block);
            }

            rx.recv().unwrap_or(false)
        }
        #[cfg(not(target_os = "macos"))]
        {
            true
        }
    }
}
