//! Prompt templates for RAG generation

use crate::error::{Error, Result};
use crate::types::{ChatMessage, Role};

/// Instruction text of the bundled RAG prompt
pub const RAG_PROMPT_TEMPLATE: &str = "You are an assistant for question-answering tasks. \
Use the following pieces of retrieved context to answer the question. \
If you don't know the answer, just say that you don't know. \
Use three sentences maximum and keep the answer concise.\n\
Question: {question} \n\
Context: {context} \n\
Answer:";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Slot(String),
}

/// A text template with `{name}` slots; `{{` and `}}` are literal braces
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    source: String,
    segments: Vec<Segment>,
}

impl PromptTemplate {
    /// Parse a template
    pub fn parse(template: &str) -> Result<Self> {
        let mut segments = Vec::new();
        let mut literal = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') | None => {
                                return Err(Error::prompt(format!(
                                    "Unclosed '{{' in template: {}",
                                    template
                                )))
                            }
                            Some(ch) => name.push(ch),
                        }
                    }
                    let name = name.trim();
                    if name.is_empty() {
                        return Err(Error::prompt("Empty '{}' slot in template"));
                    }
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Slot(name.to_string()));
                }
                '}' => {
                    return Err(Error::prompt(format!(
                        "Single '}}' in template: {}",
                        template
                    )))
                }
                _ => literal.push(c),
            }
        }

        if !literal.is_empty() {
            segments.push(Segment::Literal(literal));
        }

        Ok(Self {
            source: template.to_string(),
            segments,
        })
    }

    /// Slot names in first-use order
    pub fn input_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Slot(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Fill every slot; unbound slots are an error, unused values are ignored
    pub fn format(&self, vars: &[(&str, &str)]) -> Result<String> {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(name) => {
                    let value = vars
                        .iter()
                        .find(|(key, _)| *key == name.as_str())
                        .map(|(_, value)| *value)
                        .ok_or_else(|| Error::prompt(format!("Missing value for '{}'", name)))?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

/// An ordered list of role-tagged message templates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPromptTemplate {
    messages: Vec<(Role, PromptTemplate)>,
}

impl ChatPromptTemplate {
    pub fn new(messages: Vec<(Role, PromptTemplate)>) -> Self {
        Self { messages }
    }

    /// A single user message
    pub fn from_template(template: &str) -> Result<Self> {
        Ok(Self::new(vec![(Role::User, PromptTemplate::parse(template)?)]))
    }

    /// Slot names across all messages, in first-use order
    pub fn input_variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for (_, template) in &self.messages {
            for name in template.input_variables() {
                if !names.contains(&name) {
                    names.push(name);
                }
            }
        }
        names
    }

    /// Fill every message
    pub fn format_messages(&self, vars: &[(&str, &str)]) -> Result<Vec<ChatMessage>> {
        self.messages
            .iter()
            .map(|(role, template)| Ok(ChatMessage::new(*role, template.format(vars)?)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

/// The bundled RAG prompt: one user message with `question` and `context` slots
pub fn rag_prompt() -> Result<ChatPromptTemplate> {
    ChatPromptTemplate::from_template(RAG_PROMPT_TEMPLATE)
}
