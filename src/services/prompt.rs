//! Prompt compilation.
//!
//! Pure functions that turn a unified profile plus per-operation context
//! into a finished prompt string and the output shape the gateway should
//! validate the model's reply against.

use std::fmt::Write as _;

use crate::domain::models::{TaskStep, UnifiedProfile};

/// Expected parse target for a compiled prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputShape {
    /// A JSON array of objects, each carrying at least `required_fields`.
    ObjectArray {
        min: usize,
        max: usize,
        required_fields: &'static [&'static str],
    },
    /// Free-form markdown document.
    Document,
}

/// A compiled prompt plus its expected output shape.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub text: String,
    pub shape: OutputShape,
}

pub const TASK_FIELDS: &[&str] = &["title", "description", "agent"];
pub const STEP_FIELDS: &[&str] = &["title", "description"];
pub const QUESTION_FIELDS: &[&str] = &["question", "purpose"];
pub const RECOMMENDATION_FIELDS: &[&str] = &["title", "description", "agent"];

fn opt(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => "unspecified",
    }
}

fn list(values: &[String]) -> String {
    if values.is_empty() {
        "unspecified".to_string()
    } else {
        values.join(", ")
    }
}

fn render_profile(profile: &UnifiedProfile, out: &mut String) {
    out.push_str("BUSINESS CONTEXT:\n");
    if let Some(p) = &profile.profile {
        let _ = writeln!(out, "- Brand name: {}", opt(p.brand_name.as_deref()));
        let _ = writeln!(
            out,
            "- Description: {}",
            opt(p.business_description.as_deref())
        );
        let _ = writeln!(out, "- Business type: {}", opt(p.business_type.as_deref()));
        let _ = writeln!(out, "- Target market: {}", opt(p.target_market.as_deref()));
        let _ = writeln!(out, "- Current stage: {}", opt(p.current_stage.as_deref()));
        let _ = writeln!(out, "- Location: {}", opt(p.location.as_deref()));
        let _ = writeln!(out, "- Team size: {}", opt(p.team_size.as_deref()));
        let _ = writeln!(
            out,
            "- Time availability: {}",
            opt(p.time_availability.as_deref())
        );
        let _ = match p.monthly_revenue_goal {
            Some(goal) => writeln!(out, "- Monthly revenue goal: {goal}"),
            None => writeln!(out, "- Monthly revenue goal: unspecified"),
        };
        let _ = match p.years_in_business {
            Some(years) => writeln!(out, "- Years in business: {years}"),
            None => writeln!(out, "- Years in business: unspecified"),
        };
        let _ = writeln!(
            out,
            "- Initial investment: {}",
            opt(p.initial_investment.as_deref())
        );
        let _ = writeln!(out, "- Primary skills: {}", list(&p.primary_skills));
        let _ = writeln!(out, "- Current challenges: {}", list(&p.current_challenges));
        let _ = writeln!(out, "- Business goals: {}", list(&p.business_goals));
        let _ = writeln!(out, "- Sales channels: {}", list(&p.sales_channels));
        let _ = writeln!(
            out,
            "- Social media presence: {}",
            opt(p.social_media_presence.as_deref())
        );
    } else {
        out.push_str("- No stored business profile.\n");
    }

    if let Some(m) = &profile.maturity {
        out.push_str("\nBUSINESS MATURITY (0-100):\n");
        let _ = writeln!(out, "- Idea validation: {}", m.idea_validation);
        let _ = writeln!(out, "- User experience: {}", m.user_experience);
        let _ = writeln!(out, "- Market fit: {}", m.market_fit);
        let _ = writeln!(out, "- Monetization: {}", m.monetization);
        let _ = writeln!(
            out,
            "Prioritize work that strengthens the lowest-scoring areas, starting with {}.",
            m.weakest_dimension()
        );
    }
}

fn render_history(profile: &UnifiedProfile, out: &mut String) {
    out.push_str("\nEXISTING TASKS:\n");
    let _ = writeln!(
        out,
        "- Active: {}",
        list(&profile.history.active_titles)
    );
    let _ = writeln!(
        out,
        "- Completed: {}",
        list(&profile.history.completed_titles)
    );
    out.push_str("Do not propose tasks that duplicate any title listed above.\n");
}

fn agent_roster(out: &mut String) {
    out.push_str("\nAssign each item an \"agent\" from exactly this list: ");
    let names: Vec<&str> = crate::domain::models::AgentKind::all()
        .iter()
        .map(|a| a.as_str())
        .collect();
    out.push_str(&names.join(", "));
    out.push_str(".\n");
}

/// Compile the task-generation prompt.
pub fn compile_task_generation(profile: &UnifiedProfile) -> Prompt {
    let mut text = String::from(
        "You are a business coach for early-stage entrepreneurs. \
         Generate the next concrete tasks this founder should work on.\n\n",
    );
    render_profile(profile, &mut text);
    render_history(profile, &mut text);
    agent_roster(&mut text);
    text.push_str(
        "\nRespond with ONLY a JSON array of 3 to 5 objects. Each object has: \
         \"title\" (string), \"description\" (string, actionable), \"agent\" (string), \
         \"priority\" (integer 1-5, 1 = most urgent), \"estimated_effort\" (string).\n",
    );

    Prompt {
        text,
        shape: OutputShape::ObjectArray {
            min: 1,
            max: 5,
            required_fields: TASK_FIELDS,
        },
    }
}

/// Compile the step-decomposition prompt for one task.
pub fn compile_step_decomposition(
    profile: &UnifiedProfile,
    task_title: &str,
    task_description: &str,
) -> Prompt {
    let mut text = String::from(
        "You are a business coach. Break the following task into small, \
         concrete steps the founder completes by entering information.\n\n",
    );
    let _ = writeln!(text, "TASK: {task_title}");
    let _ = writeln!(text, "DETAILS: {task_description}\n");
    render_profile(profile, &mut text);
    text.push_str(
        "\nRespond with ONLY a JSON array of 3 to 6 objects, in execution order. \
         Each object has: \"title\" (string), \"description\" (string), \
         \"input_type\" (one of: text, number, url, email, select, file), \
         \"validation_criteria\" (object), \"guidance\" (string: how to coach \
         the founder through this step).\n",
    );

    Prompt {
        text,
        shape: OutputShape::ObjectArray {
            min: 1,
            max: 6,
            required_fields: STEP_FIELDS,
        },
    }
}

/// Compile the deliverable-synthesis prompt from captured step inputs.
pub fn compile_deliverable_from_steps(
    profile: &UnifiedProfile,
    task_title: &str,
    steps: &[TaskStep],
) -> Prompt {
    let mut text = String::from(
        "You are a business coach. Using the founder's own answers below, \
         write the finished working document for this task.\n\n",
    );
    let _ = writeln!(text, "TASK: {task_title}\n");
    render_profile(profile, &mut text);

    text.push_str("\nFOUNDER'S ANSWERS:\n");
    for step in steps {
        let input = step
            .user_input
            .as_ref()
            .map(std::string::ToString::to_string)
            .unwrap_or_else(|| "(no answer)".to_string());
        let _ = writeln!(text, "{}. {}: {}", step.step_number, step.title, input);
    }

    text.push_str(
        "\nRespond with a complete, ready-to-use markdown document. Use the \
         founder's answers verbatim where they fit; fill gaps with practical \
         recommendations. Do not wrap the document in code fences.\n",
    );

    Prompt {
        text,
        shape: OutputShape::Document,
    }
}

/// Compile the deliverable-synthesis prompt from conversational Q&A pairs.
pub fn compile_deliverable_from_answers(
    profile: &UnifiedProfile,
    task_title: &str,
    answers: &[(String, String)],
) -> Prompt {
    let mut text = String::from(
        "You are a business coach. Using the founder's own answers below, \
         write the finished working document for this task.\n\n",
    );
    let _ = writeln!(text, "TASK: {task_title}\n");
    render_profile(profile, &mut text);

    text.push_str("\nFOUNDER'S ANSWERS:\n");
    for (question, answer) in answers {
        let _ = writeln!(text, "Q: {question}\nA: {answer}");
    }

    text.push_str(
        "\nRespond with a complete, ready-to-use markdown document. Use the \
         founder's answers verbatim where they fit; fill gaps with practical \
         recommendations. Do not wrap the document in code fences.\n",
    );

    Prompt {
        text,
        shape: OutputShape::Document,
    }
}

/// Compile the intelligent-questions prompt.
pub fn compile_questions(profile: &UnifiedProfile, task_title: &str) -> Prompt {
    let mut text = String::from(
        "You are a business coach gathering the information needed to produce \
         a working document for the founder's task.\n\n",
    );
    let _ = writeln!(text, "TASK: {task_title}\n");
    render_profile(profile, &mut text);
    text.push_str(
        "\nRespond with ONLY a JSON array of 3 to 5 objects. Each object has: \
         \"question\" (string, specific to this business) and \"purpose\" \
         (string: what the answer unlocks in the final document).\n",
    );

    Prompt {
        text,
        shape: OutputShape::ObjectArray {
            min: 1,
            max: 5,
            required_fields: QUESTION_FIELDS,
        },
    }
}

/// Compile the recommendation-filler prompt for the evolution engine.
pub fn compile_recommendations(profile: &UnifiedProfile) -> Prompt {
    let mut text = String::from(
        "You are a business coach. Recommend the next focus areas for this \
         founder based on what they have already accomplished.\n\n",
    );
    render_profile(profile, &mut text);
    render_history(profile, &mut text);
    agent_roster(&mut text);
    text.push_str(
        "\nRespond with ONLY a JSON array of 2 to 3 objects. Each object has: \
         \"title\" (string), \"description\" (string), \"agent\" (string), \
         \"priority\" (integer 1-5), \"rationale\" (string: why now).\n",
    );

    Prompt {
        text,
        shape: OutputShape::ObjectArray {
            min: 1,
            max: 3,
            required_fields: RECOMMENDATION_FIELDS,
        },
    }
}
