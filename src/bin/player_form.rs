// Terminal rendition of the player information form.

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};

use rugby_coach_backend::config::Config;
use rugby_coach_backend::form::{PlayerForm, PlayerFormClient, SubmissionOutcome, DEFAULT_API_URL};
use rugby_coach_backend::player::Position;

type Input = Lines<BufReader<Stdin>>;

/// Print a prompt and read one line. `None` on end of input.
async fn ask(input: &mut Input, prompt: &str, current: &str) -> Option<String> {
    print!("{prompt} [{current}]: ");
    std::io::stdout().flush().ok();
    match input.next_line().await {
        Ok(Some(line)) => Some(line),
        Ok(None) => None,
        Err(e) => {
            tracing::error!("Failed to read input: {e}");
            None
        }
    }
}

/// Prompt for a field until the form accepts the value. Blank keeps the current value.
async fn fill_field(
    input: &mut Input,
    form: &mut PlayerForm,
    name: &str,
    prompt: &str,
    current: String,
) -> Option<()> {
    loop {
        let line = ask(input, prompt, &current).await?;
        let value = if line.trim().is_empty() {
            current.clone()
        } else {
            line
        };
        match form.set_field(name, &value) {
            Ok(()) => return Some(()),
            Err(e) => println!("  {e}"),
        }
    }
}

async fn fill_position(input: &mut Input, form: &mut PlayerForm) -> Option<()> {
    println!("Positions:");
    for (i, position) in Position::ALL.iter().enumerate() {
        println!("  {:>2}. {position}", i + 1);
    }
    loop {
        let line = ask(input, "Position (name or number)", &form.position).await?;
        let choice = line.trim();
        let picked = match choice.parse::<usize>() {
            Ok(n) if (1..=Position::ALL.len()).contains(&n) => Some(Position::ALL[n - 1]),
            _ => choice.parse::<Position>().ok(),
        };
        match picked {
            Some(position) => {
                form.position = position.name().to_string();
                return Some(());
            }
            None if choice.is_empty() && !form.position.is_empty() => return Some(()),
            None => println!("  Select a position from the list"),
        }
    }
}

async fn fill_form(input: &mut Input) -> Option<PlayerForm> {
    let mut form = PlayerForm::default();
    println!("Player Information");
    println!("------------------");
    let age = form.age.to_string();
    fill_field(input, &mut form, "age", "Age", age).await?;
    fill_position(input, &mut form).await?;
    let weight = form.weight.to_string();
    fill_field(input, &mut form, "weight", "Weight (kg)", weight).await?;
    let height = form.height.to_string();
    fill_field(input, &mut form, "height", "Height (cm)", height).await?;
    let description = ask(input, "Description (skills, experience, etc.)", "").await?;
    form.description = description.trim().to_string();
    Some(form)
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().collect();
    let api_url = Config::parse_cli_value(&args, "--api-url")
        .or_else(|| std::env::var("PLAYER_API_URL").ok())
        .unwrap_or_else(|| DEFAULT_API_URL.to_string());
    let client = PlayerFormClient::new(api_url);

    match client.hello().await {
        Ok(message) => println!("{message}\n"),
        Err(e) => println!("Failed to fetch from API ({}): {e}\n", client.base_url()),
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    let Some(form) = fill_form(&mut input).await else {
        println!("\nNo submission made.");
        return;
    };

    println!("\nSubmitting...");
    match client.submit(&form).await {
        Ok(SubmissionOutcome::Analysis {
            message,
            analysis,
            fallback,
        }) => {
            println!("{message}\n");
            if fallback {
                println!("(The language model was unavailable; showing template advice.)\n");
            }
            println!("AI Analysis\n===========\n{analysis}");
        }
        Ok(SubmissionOutcome::Error { message, error }) => {
            if let Some(message) = message {
                println!("{message}");
            }
            eprintln!("Error: {error}");
            std::process::exit(1);
        }
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
