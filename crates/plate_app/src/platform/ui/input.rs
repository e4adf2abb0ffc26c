use std::fs;
use std::path::Path;

use anyhow::Context;
use plate_core::{AppViewModel, ImageSelection, Msg, View};

use super::constants::*;

/// Which login field the next line fills in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginPrompt {
    #[default]
    Name,
    Email,
}

#[derive(Debug, PartialEq)]
pub enum Command {
    Dispatch(Vec<Msg>),
    Quit,
    Ignore,
    Invalid(String),
}

/// Translates one line of user input into messages for the current view.
///
/// While a sign-in is in flight the login prompt stays where it is.
pub fn interpret(line: &str, view: &AppViewModel, login: &mut LoginPrompt) -> Command {
    let line = line.trim();
    if line.eq_ignore_ascii_case(CMD_QUIT) {
        return Command::Quit;
    }

    match view.view {
        View::Login if view.login.submitting => Command::Ignore,
        View::Login => match *login {
            LoginPrompt::Name => {
                *login = LoginPrompt::Email;
                Command::Dispatch(vec![Msg::LoginNameChanged(line.to_string())])
            }
            LoginPrompt::Email => {
                *login = LoginPrompt::Name;
                Command::Dispatch(vec![
                    Msg::LoginEmailChanged(line.to_string()),
                    Msg::LoginSubmitted,
                ])
            }
        },
        View::Capture => {
            if line.is_empty() {
                Command::Ignore
            } else if line.eq_ignore_ascii_case(CMD_ANALYZE) {
                Command::Dispatch(vec![Msg::UploadClicked])
            } else {
                match load_image(Path::new(line)) {
                    Ok(selection) => Command::Dispatch(vec![Msg::ImageSelected(selection)]),
                    Err(err) => Command::Invalid(format!("{err:#}")),
                }
            }
        }
        View::Analyzing if line.eq_ignore_ascii_case(CMD_BACK) => {
            Command::Dispatch(vec![Msg::RestartClicked])
        }
        View::Results if line.eq_ignore_ascii_case(CMD_NEW) => {
            Command::Dispatch(vec![Msg::RestartClicked])
        }
        View::Analyzing | View::Results => Command::Ignore,
    }
}

/// Reads a photo from disk, declaring its type from the file extension.
pub fn load_image(path: &Path) -> anyhow::Result<ImageSelection> {
    let bytes = fs::read(path).with_context(|| format!("Cannot read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    Ok(ImageSelection {
        file_name,
        mime_type: mime_for_path(path).to_string(),
        bytes,
    })
}

pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "heic" => "image/heic",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use plate_core::{AppViewModel, LoginView, Msg, View};
    use tempfile::TempDir;

    use super::{interpret, mime_for_path, Command, LoginPrompt};

    fn screen(view: View) -> AppViewModel {
        AppViewModel {
            view,
            ..AppViewModel::default()
        }
    }

    #[test]
    fn login_alternates_between_name_and_email() {
        let mut prompt = LoginPrompt::default();
        assert_eq!(
            interpret(" Ada ", &screen(View::Login), &mut prompt),
            Command::Dispatch(vec![Msg::LoginNameChanged("Ada".to_string())])
        );
        assert_eq!(prompt, LoginPrompt::Email);
        assert_eq!(
            interpret("ada@example.com", &screen(View::Login), &mut prompt),
            Command::Dispatch(vec![
                Msg::LoginEmailChanged("ada@example.com".to_string()),
                Msg::LoginSubmitted,
            ])
        );
        assert_eq!(prompt, LoginPrompt::Name);
    }

    #[test]
    fn prompt_holds_while_signing_in() {
        let signing_in = AppViewModel {
            view: View::Login,
            login: LoginView {
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                submitting: true,
            },
            ..AppViewModel::default()
        };
        let mut prompt = LoginPrompt::Name;
        assert_eq!(interpret("Bob", &signing_in, &mut prompt), Command::Ignore);
        assert_eq!(prompt, LoginPrompt::Name);

        let mut prompt = LoginPrompt::Email;
        assert_eq!(interpret("bob@example.com", &signing_in, &mut prompt), Command::Ignore);
        assert_eq!(prompt, LoginPrompt::Email);
        assert_eq!(interpret("quit", &signing_in, &mut prompt), Command::Quit);
    }

    #[test]
    fn quit_works_in_every_view() {
        let mut prompt = LoginPrompt::default();
        for view in [View::Login, View::Capture, View::Analyzing, View::Results] {
            assert_eq!(interpret("quit", &screen(view), &mut prompt), Command::Quit);
        }
    }

    #[test]
    fn capture_reads_the_photo_from_disk() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("lunch.PNG");
        fs::write(&path, [0x89, b'P', b'N', b'G']).unwrap();

        let mut prompt = LoginPrompt::default();
        let command = interpret(path.to_str().unwrap(), &screen(View::Capture), &mut prompt);
        let Command::Dispatch(msgs) = command else {
            panic!("expected dispatch, got {command:?}");
        };
        let [Msg::ImageSelected(selection)] = msgs.as_slice() else {
            panic!("expected image selection");
        };
        assert_eq!(selection.file_name, "lunch.PNG");
        assert_eq!(selection.mime_type, "image/png");
        assert_eq!(selection.bytes, vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn missing_photo_is_reported() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("missing.jpg");
        let mut prompt = LoginPrompt::default();
        let command = interpret(path.to_str().unwrap(), &screen(View::Capture), &mut prompt);
        assert!(matches!(command, Command::Invalid(message) if message.contains("missing.jpg")));
    }

    #[test]
    fn view_specific_commands() {
        let mut prompt = LoginPrompt::default();
        assert_eq!(
            interpret("analyze", &screen(View::Capture), &mut prompt),
            Command::Dispatch(vec![Msg::UploadClicked])
        );
        assert_eq!(
            interpret("back", &screen(View::Analyzing), &mut prompt),
            Command::Dispatch(vec![Msg::RestartClicked])
        );
        assert_eq!(
            interpret("new", &screen(View::Results), &mut prompt),
            Command::Dispatch(vec![Msg::RestartClicked])
        );
        assert_eq!(interpret("new", &screen(View::Analyzing), &mut prompt), Command::Ignore);
        assert_eq!(interpret("", &screen(View::Capture), &mut prompt), Command::Ignore);
    }

    #[test]
    fn extension_decides_declared_type() {
        assert_eq!(mime_for_path(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.JPEG")), "image/jpeg");
        assert_eq!(mime_for_path(Path::new("a.gif")), "image/gif");
        assert_eq!(mime_for_path(Path::new("notes.txt")), "application/octet-stream");
        assert_eq!(mime_for_path(Path::new("noext")), "application/octet-stream");
    }
}
