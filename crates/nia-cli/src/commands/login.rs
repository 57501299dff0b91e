use anyhow::Result;
use colored::Colorize;
use nia_application::{ChildSessionUseCase, LoginScreen};
use nia_core::auth::{LoginProgress, PIN_LENGTH, PinLogin};
use nia_core::child::ChildIdentity;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;

/// Where the PIN pad sends the child next. A signed-in child goes
/// straight into the chat.
enum PadExit {
    SignedIn,
    Back,
    Quit,
}

pub async fn run(usecase: &ChildSessionUseCase) -> Result<()> {
    let login = match usecase.begin_login().await? {
        LoginScreen::Picker(login) => login,
        screen @ LoginScreen::NoProfiles => {
            if let Some(message) = screen.message() {
                println!("{}", message.yellow());
            }
            return Ok(());
        }
    };

    let mut rl = DefaultEditor::new()?;
    println!("{}", "=== Who's learning today? ===".bright_magenta().bold());

    loop {
        let children = login.children().await;
        print_profiles(&children);

        let line = match rl.readline("Pick a number (q to quit): ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(()),
            Err(e) => return Err(e.into()),
        };
        let choice = line.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        let Some(child) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| children.get(i))
        else {
            println!("{}", "Please type one of the numbers above.".bright_black());
            continue;
        };

        login.select(child.id).await?;
        match pin_pad(&login, &mut rl, child).await? {
            PadExit::SignedIn => {
                drop(rl);
                return super::chat::run(usecase).await;
            }
            PadExit::Back => continue,
            PadExit::Quit => return Ok(()),
        }
    }
}

fn print_profiles(children: &[ChildIdentity]) {
    for (i, child) in children.iter().enumerate() {
        let badge = child.initial().map(String::from).unwrap_or_default();
        println!(
            "  {} {} {} {}",
            format!("{}.", i + 1).bright_black(),
            format!("[{badge}]").bright_cyan(),
            child.display_name.bold(),
            format!("({})", child.grade_level).bright_black()
        );
    }
}

/// Each typed character is one key press: digits fill the PIN, `-` deletes
/// the last digit and `b` goes back to the profile list.
async fn pin_pad(
    login: &PinLogin,
    rl: &mut DefaultEditor,
    child: &ChildIdentity,
) -> Result<PadExit> {
    println!(
        "{}",
        format!("Hi {}! Enter your {PIN_LENGTH}-digit PIN.", child.display_name).bright_green()
    );

    loop {
        let entered = login.view().await.entered;
        let dots = "●".repeat(entered) + &"○".repeat(PIN_LENGTH.saturating_sub(entered));
        let line = match rl.readline(&format!("{dots}  PIN (b=back, -=delete): ")) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => return Ok(PadExit::Quit),
            Err(e) => return Err(e.into()),
        };

        for c in line.trim().chars() {
            match c {
                'b' | 'B' => {
                    login.back().await;
                    return Ok(PadExit::Back);
                }
                '-' => {
                    login.backspace().await;
                }
                _ if c.is_ascii_digit() => match login.press_char(c).await? {
                    LoginProgress::Authenticated(session) => {
                        println!(
                            "{}",
                            format!(
                                "Welcome, {}! Let's start chatting.",
                                session.child.display_name
                            )
                            .bright_green()
                            .bold()
                        );
                        return Ok(PadExit::SignedIn);
                    }
                    LoginProgress::Rejected => {
                        if let Some(error) = login.view().await.error {
                            println!("{}", error.red());
                        }
                        break;
                    }
                    LoginProgress::Entering { .. } | LoginProgress::Ignored => {}
                },
                _ => {}
            }
        }
    }
}
