//! Prompts for nutrition requests.
//!
//! The system prompt is built from the schema descriptor, so the key order
//! and bounds the model is told about are the ones the validator enforces:
//! 1. Base prompt (shared by every request)
//! 2. Schema section (per payload shape): ordered keys, kinds, ranges and
//!    the JSON Schema document
//! 3. User message (per request): the user's own description

use chrono::NaiveDate;
use nutriguard_core::{SchemaDescriptor, ValueKind, FOOD_SCHEMA, GOAL_SCHEMA};

/// Base system prompt shared by every nutrition request.
pub const BASE_SYSTEM_PROMPT: &str = r#"
You are a nutrition assistant inside a food logging app.

You answer with a single flat JSON object and nothing else.
No prose before or after the object.
No markdown code fences.
No comments inside the JSON.

## Output Rules
1. Use exactly the keys listed below, in exactly the order listed
2. Never add keys and never leave a key out
3. Text values are JSON strings and must not be empty
4. Numeric values are plain JSON numbers (no quotes, no units, no exponents)
5. Every number must fall inside the range given for its key
6. If the description is vague, give your best realistic estimate rather
   than refusing
"#;

/// Task prompt for daily goal estimation.
pub const GOAL_TASK_PROMPT: &str = r#"
## Task: Daily Goal Estimate

Estimate sensible daily energy and macronutrient targets for the person
described by the user. Set "date" to the date the goal starts, formatted
YYYY-MM-DD.
"#;

/// Task prompt for food analysis.
pub const FOOD_TASK_PROMPT: &str = r#"
## Task: Food Analysis

Estimate the nutrition facts of the food the user describes. "name" is a
short display name for the food. "servings" is how many servings the user
ate. All other amounts are for ONE serving.
"#;

/// Build the system prompt for requests decoded against `schema`.
pub fn system_prompt(schema: &SchemaDescriptor) -> String {
    let mut prompt = String::from(BASE_SYSTEM_PROMPT);

    match schema.name() {
        name if name == GOAL_SCHEMA.name() => prompt.push_str(GOAL_TASK_PROMPT),
        name if name == FOOD_SCHEMA.name() => prompt.push_str(FOOD_TASK_PROMPT),
        _ => {}
    }

    prompt.push_str("\n## Keys (in order)\n");
    for (index, field) in schema.fields().iter().enumerate() {
        let line = match (field.kind, field.range) {
            (ValueKind::Number, Some(range)) => {
                format!("{}. \"{}\": number in {}\n", index + 1, field.key, range)
            }
            (kind, _) => format!("{}. \"{}\": {}\n", index + 1, field.key, kind),
        };
        prompt.push_str(&line);
    }

    prompt.push_str(&format!("\n## JSON Schema\n{:#}\n", schema.to_json_schema()));

    prompt
}

/// User message for a goal estimate.
pub fn goal_prompt(description: &str, today: NaiveDate) -> String {
    format!(
        "Today is {}.\n\nAbout me:\n{}",
        today.format("%Y-%m-%d"),
        description.trim()
    )
}

/// User message for a food analysis.
pub fn food_prompt(description: &str) -> String {
    format!("What I ate:\n{}", description.trim())
}

/// User message for requests decoded against `schema`.
pub fn user_prompt(schema: &SchemaDescriptor, description: &str, today: NaiveDate) -> String {
    if schema.name() == GOAL_SCHEMA.name() {
        goal_prompt(description, today)
    } else if schema.name() == FOOD_SCHEMA.name() {
        food_prompt(description)
    } else {
        description.trim().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_goal_system_prompt_lists_keys_in_order() {
        let prompt = system_prompt(&GOAL_SCHEMA);
        assert!(prompt.contains("Daily Goal Estimate"));

        let positions: Vec<usize> = GOAL_SCHEMA
            .keys()
            .map(|key| prompt.find(&format!("\"{}\":", key)).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_food_system_prompt_states_ranges() {
        let prompt = system_prompt(&FOOD_SCHEMA);
        assert!(prompt.contains("Food Analysis"));
        assert!(prompt.contains("\"servings\": number in (0, 50]"));
        assert!(prompt.contains("\"fiber_g\": number in [0, 200]"));
        assert!(prompt.contains("\"name\": string"));
    }

    #[test]
    fn test_system_prompt_embeds_json_schema() {
        let prompt = system_prompt(&FOOD_SCHEMA);
        assert!(prompt.contains("## JSON Schema"));
        assert!(prompt.contains("\"additionalProperties\": false"));
    }

    #[test]
    fn test_goal_prompt_carries_date() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        let prompt = goal_prompt("  30 year old, 80kg, runs twice a week \n", today);
        assert!(prompt.starts_with("Today is 2024-03-09."));
        assert!(prompt.ends_with("runs twice a week"));
    }

    #[test]
    fn test_user_prompt_dispatches_on_schema() {
        let today = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            user_prompt(&FOOD_SCHEMA, "an apple", today),
            food_prompt("an apple")
        );
        assert_eq!(
            user_prompt(&GOAL_SCHEMA, "me", today),
            goal_prompt("me", today)
        );
    }
}
