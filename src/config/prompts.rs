//! Prompt templates for Svar.
//!
//! Templates use {{variable}} placeholders rendered at call time.

use serde::{Deserialize, Serialize};

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub retrieval: RetrievalPrompts,
    pub answer: AnswerPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for history-aware query rephrasing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalPrompts {
    /// Instruction appended after the conversation to produce a standalone
    /// search query.
    pub rephrase: String,
}

impl Default for RetrievalPrompts {
    fn default() -> Self {
        Self {
            rephrase: "Given the above conversation, generate a search query to look up \
                       in order to get information relevant to the conversation"
                .to_string(),
        }
    }
}

/// Prompts for answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerPrompts {
    pub system: String,
}

impl Default for AnswerPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are a {{domain}} FAQs assistant. Your knowledge is limited to the information provided in the context.
You will answer the question based solely on this information:

{{context}}

Do not make up your own answer.
If the answer is not present in the information, you will respond 'I don't have that information.'
If a question is outside the context of {{domain}}, you will respond 'I can only help with {{domain}} related questions.'"#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config
    /// variables. Provided variables take precedence.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }

    /// Build prompts from config, carrying over custom variables.
    pub fn from_settings(settings: &super::Settings) -> Self {
        let mut prompts = Prompts::default();
        prompts.variables = settings.prompts.variables.clone();
        prompts
    }
}
