// Coaching analysis: prompt construction, the model call, and the templated fallback.

use crate::llm::{ChatMessage, CompletionError, CompletionProvider};
use crate::metrics;
use crate::player::{Position, PlayerProfile};

pub const TEMPERATURE: f32 = 0.7;

pub const SYSTEM_PROMPT: &str = "You are an expert rugby coach with years of experience \
developing players at every level of the game. Give specific, practical advice on \
position-specific skills, strength and conditioning, and areas for improvement based on \
the player's physical profile. Format your answer in markdown with clear headings.";

/// Placeholder used in the prompt when the player left no description.
pub const NO_DESCRIPTION: &str = "None provided";

/// Where the returned analysis text came from.
#[derive(Debug, Clone, PartialEq)]
pub enum Analysis {
    /// Text generated by the language model, passed through verbatim.
    Analyzed { text: String },
    /// Templated text used because the model call failed.
    Fallback { text: String, reason: String },
}

impl Analysis {
    pub fn text(&self) -> &str {
        match self {
            Analysis::Analyzed { text } | Analysis::Fallback { text, .. } => text,
        }
    }

    pub fn source(&self) -> &'static str {
        match self {
            Analysis::Analyzed { .. } => "model",
            Analysis::Fallback { .. } => "fallback",
        }
    }
}

/// Build the system and user messages for one player.
pub fn build_messages(profile: &PlayerProfile) -> Vec<ChatMessage> {
    let user = format!(
        "Please analyze this rugby player and provide coaching advice:\n\n\
         Age: {}\n\
         Position: {}\n\
         Weight: {}kg\n\
         Height: {}cm\n\
         Description: {}\n\n\
         Provide an assessment of how well their physical profile suits the position, \
         the key skills to develop, and a training focus for the next season.",
        profile.submitted.age,
        profile.submitted.position,
        profile.submitted.weight,
        profile.submitted.height,
        profile.description().unwrap_or(NO_DESCRIPTION),
    );

    vec![ChatMessage::system(SYSTEM_PROMPT), ChatMessage::user(user)]
}

/// Ask the model for an analysis, falling back to the template on any error.
///
/// Never fails: an upstream error becomes [`Analysis::Fallback`] with the
/// error's message as the reason.
pub async fn analyze(provider: &dyn CompletionProvider, profile: &PlayerProfile) -> Analysis {
    let messages = build_messages(profile);

    let reply = provider
        .complete(&messages, TEMPERATURE)
        .await
        .and_then(|text| {
            if text.trim().is_empty() {
                Err(CompletionError::EmptyChoices)
            } else {
                Ok(text)
            }
        });

    match reply {
        Ok(text) => {
            metrics::PLAYER_SUBMISSIONS_TOTAL
                .with_label_values(&["analyzed"])
                .inc();
            Analysis::Analyzed { text }
        }
        Err(e) => {
            tracing::warn!(
                "Completion via {} failed ({}), using fallback analysis: {e}",
                provider.model_name(),
                e.kind()
            );
            metrics::COMPLETION_FAILURES_TOTAL
                .with_label_values(&[e.kind()])
                .inc();
            metrics::PLAYER_SUBMISSIONS_TOTAL
                .with_label_values(&["fallback"])
                .inc();
            Analysis::Fallback {
                text: fallback_analysis(profile),
                reason: e.to_string(),
            }
        }
    }
}

/// Skill focus areas listed in the fallback text for each position.
fn position_focus(position: Position) -> [&'static str; 3] {
    match position {
        Position::Prop => [
            "Scrum stability and binding technique",
            "Lower-body strength for driving mauls",
            "Short-range carries and tackle efficiency",
        ],
        Position::Hooker => [
            "Lineout throwing accuracy under pressure",
            "Striking for the ball in the scrum",
            "Breakdown work and ball carrying in tight channels",
        ],
        Position::Lock => [
            "Lineout jumping, calling and lifting",
            "Scrum drive from the second row",
            "Work rate around the park and clearing rucks",
        ],
        Position::Flanker => [
            "Jackaling and turnovers at the breakdown",
            "Dominant defensive tackling",
            "Support lines in attack",
        ],
        Position::Number8 => [
            "Control at the base of the scrum",
            "Powerful carries from set piece",
            "Linking play between forwards and backs",
        ],
        Position::ScrumHalf => [
            "Pass speed and accuracy off both hands",
            "Box kicking and tactical game management",
            "Sniping around the fringes",
        ],
        Position::FlyHalf => [
            "Decision making and game management",
            "Tactical and goal kicking",
            "Distribution and running flat to the line",
        ],
        Position::Center => [
            "Line breaking and footwork in contact",
            "Defensive organisation in the midfield",
            "Offloading and creating space for the wings",
        ],
        Position::Wing => [
            "Top-end speed and acceleration",
            "Finishing in tight spaces near the touchline",
            "High-ball catching and kick chase",
        ],
        Position::FullBack => [
            "Positional awareness and backfield coverage",
            "Counter-attacking from kick receipts",
            "Last-line tackling and communication",
        ],
    }
}

/// Deterministic coaching text built only from the submitted fields.
pub fn fallback_analysis(profile: &PlayerProfile) -> String {
    let position = profile.position;
    let unit = if position.is_forward() {
        "forward"
    } else {
        "back"
    };
    let focus = position_focus(position)
        .iter()
        .enumerate()
        .map(|(i, item)| format!("{}. {item}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");
    let notes = match profile.description() {
        Some(description) => format!(
            "You described yourself as: \"{description}\". Use these strengths as the \
             foundation for your development plan."
        ),
        None => "Add a description of your experience and skills next time for more \
                 tailored advice."
            .to_string(),
    };

    format!(
        "# Player Analysis: {shown}\n\n\
         ## Physical Profile\n\
         - Age: {age}\n\
         - Height: {height}cm\n\
         - Weight: {weight}kg\n\n\
         At {age} years old, {height}cm and {weight}kg, you are being assessed as a \
         {shown}, a {unit} position.\n\n\
         ## Key Focus Areas\n\
         {focus}\n\n\
         ## Training Recommendations\n\
         - Build a strength and conditioning block suited to the demands of a {unit}.\n\
         - Review match footage of elite {canonical} players and note their positioning.\n\
         - Schedule regular skill sessions that target the focus areas above.\n\n\
         ## Notes\n\
         {notes}\n",
        shown = profile.submitted.position,
        canonical = position,
        age = profile.submitted.age,
        height = profile.submitted.height,
        weight = profile.submitted.weight,
    )
}
