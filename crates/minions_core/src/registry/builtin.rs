//! Built-in MinionType catalogue shipped with every registry.

use crate::model::field::{FieldDefinition, FieldType, FieldValidation};
use crate::model::minion_type::MinionType;

pub const NOTE_TYPE_ID: &str = "builtin-note";
pub const LINK_TYPE_ID: &str = "builtin-link";
pub const FILE_TYPE_ID: &str = "builtin-file";
pub const CONTACT_TYPE_ID: &str = "builtin-contact";
pub const AGENT_TYPE_ID: &str = "builtin-agent";
pub const TEAM_TYPE_ID: &str = "builtin-team";
pub const THOUGHT_TYPE_ID: &str = "builtin-thought";
pub const PROMPT_TEMPLATE_TYPE_ID: &str = "builtin-prompt-template";
pub const TEST_CASE_TYPE_ID: &str = "builtin-test-case";
pub const TASK_TYPE_ID: &str = "builtin-task";

/// Returns every built-in type in catalogue order.
pub fn builtin_types() -> Vec<MinionType> {
    vec![
        note_type(),
        link_type(),
        file_type(),
        contact_type(),
        agent_type(),
        team_type(),
        thought_type(),
        prompt_template_type(),
        test_case_type(),
        task_type(),
    ]
}

/// A simple text note.
pub fn note_type() -> MinionType {
    system_type(
        NOTE_TYPE_ID,
        "note",
        "Note",
        "A simple text note.",
        vec![field("content", FieldType::Textarea, "Content").required()],
    )
}

/// A web link or bookmark.
pub fn link_type() -> MinionType {
    system_type(
        LINK_TYPE_ID,
        "link",
        "Link",
        "A web link or bookmark.",
        vec![
            field("url", FieldType::Url, "URL").required(),
            field("description", FieldType::Textarea, "Description"),
        ],
    )
}

/// A file attachment reference.
pub fn file_type() -> MinionType {
    system_type(
        FILE_TYPE_ID,
        "file",
        "File",
        "A file attachment reference.",
        vec![
            field("filename", FieldType::String, "Filename").required(),
            field("fileUrl", FieldType::Url, "File URL").required(),
            field("fileSize", FieldType::Number, "File Size (bytes)"),
            field("mimeType", FieldType::String, "MIME Type"),
        ],
    )
}

/// A person or entity contact record.
pub fn contact_type() -> MinionType {
    system_type(
        CONTACT_TYPE_ID,
        "contact",
        "Contact",
        "A person or entity contact record.",
        vec![
            field("name", FieldType::String, "Name").required(),
            field("email", FieldType::Email, "Email"),
            field("phone", FieldType::String, "Phone"),
            field("company", FieldType::String, "Company"),
            field("notes", FieldType::Textarea, "Notes"),
        ],
    )
}

/// An AI agent definition.
pub fn agent_type() -> MinionType {
    system_type(
        AGENT_TYPE_ID,
        "agent",
        "Agent",
        "An AI agent definition.",
        vec![
            field("role", FieldType::String, "Role"),
            field("model", FieldType::String, "Model"),
            field("systemPrompt", FieldType::Textarea, "System Prompt"),
            field("temperature", FieldType::Number, "Temperature")
                .with_validation(range(0.0, 2.0)),
            field("maxTokens", FieldType::Number, "Max Tokens"),
            field("tools", FieldType::Tags, "Tools"),
        ],
    )
}

/// A group of agents working together.
pub fn team_type() -> MinionType {
    let mut minion_type = system_type(
        TEAM_TYPE_ID,
        "team",
        "Team",
        "A group of agents working together.",
        vec![
            field("members", FieldType::Tags, "Members"),
            field("strategy", FieldType::Select, "Strategy").with_options([
                "round_robin",
                "parallel",
                "sequential",
            ]),
            field("maxConcurrency", FieldType::Number, "Max Concurrency"),
        ],
    );
    minion_type.is_organizational = Some(true);
    minion_type
}

/// A recorded thought, observation, or memory.
pub fn thought_type() -> MinionType {
    system_type(
        THOUGHT_TYPE_ID,
        "thought",
        "Thought",
        "A recorded thought, observation, or memory.",
        vec![
            field("content", FieldType::Textarea, "Content").required(),
            field("confidence", FieldType::Number, "Confidence").with_validation(range(0.0, 1.0)),
            field("source", FieldType::String, "Source"),
        ],
    )
}

/// A reusable prompt template with variables.
pub fn prompt_template_type() -> MinionType {
    system_type(
        PROMPT_TEMPLATE_TYPE_ID,
        "prompt-template",
        "Prompt Template",
        "A reusable prompt template with variables.",
        vec![
            field("template", FieldType::Textarea, "Template").required(),
            field("variables", FieldType::Tags, "Variables"),
            field("outputFormat", FieldType::Select, "Output Format")
                .with_options(["text", "json", "markdown"]),
        ],
    )
}

/// A test case for evaluating agent behavior.
pub fn test_case_type() -> MinionType {
    system_type(
        TEST_CASE_TYPE_ID,
        "test-case",
        "Test Case",
        "A test case for evaluating agent behavior.",
        vec![
            field("input", FieldType::Json, "Input").required(),
            field("expectedOutput", FieldType::Json, "Expected Output"),
            field("assertions", FieldType::Json, "Assertions"),
            field("timeout", FieldType::Number, "Timeout (ms)"),
        ],
    )
}

/// A unit of work to be executed.
pub fn task_type() -> MinionType {
    system_type(
        TASK_TYPE_ID,
        "task",
        "Task",
        "A unit of work to be executed.",
        vec![
            field("input", FieldType::Json, "Input"),
            field("output", FieldType::Json, "Output"),
            field("executionStatus", FieldType::Select, "Execution Status").with_options([
                "pending",
                "running",
                "completed",
                "failed",
                "cancelled",
            ]),
            field("startedAt", FieldType::Date, "Started At"),
            field("completedAt", FieldType::Date, "Completed At"),
            field("error", FieldType::Textarea, "Error"),
        ],
    )
}

fn system_type(
    id: &str,
    slug: &str,
    name: &str,
    description: &str,
    schema: Vec<FieldDefinition>,
) -> MinionType {
    let mut minion_type = MinionType::new(id, slug, name, schema);
    minion_type.description = Some(description.to_string());
    minion_type.is_system = Some(true);
    minion_type
}

fn field(name: &str, field_type: FieldType, label: &str) -> FieldDefinition {
    FieldDefinition::new(name, field_type).with_label(label)
}

fn range(min: f64, max: f64) -> FieldValidation {
    FieldValidation {
        min: Some(min),
        max: Some(max),
        ..FieldValidation::default()
    }
}
