use colored::Colorize;
use nia_application::ChildSessionUseCase;

pub fn whoami(usecase: &ChildSessionUseCase) {
    match usecase.require_session() {
        Ok(session) => println!(
            "{} ({}), signed in {}",
            session.child.display_name.bright_green().bold(),
            session.child.grade_level,
            session.established_at.format("%Y-%m-%d %H:%M UTC")
        ),
        Err(_) => println!("{}", "Nobody is signed in. Run `nia login`.".yellow()),
    }
}

pub async fn logout(usecase: &ChildSessionUseCase) {
    match usecase.current_child() {
        Some(child) => {
            usecase.logout().await;
            println!("{}", format!("Bye, {}!", child.display_name).bright_green());
        }
        None => println!("{}", "Nobody was signed in.".bright_black()),
    }
}
