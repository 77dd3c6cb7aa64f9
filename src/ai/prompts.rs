//! Prompt templates for code review, commit message generation and diff
//! summarization.

use std::fmt;
use std::str::FromStr;

use crate::git::ChangedFile;

/// What the final completion call should produce.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PromptType {
    /// Detailed code review of the changes.
    Analyze,
    /// Commit title and body for the changes.
    Create,
}

impl fmt::Display for PromptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Analyze => write!(f, "analyze"),
            Self::Create => write!(f, "create"),
        }
    }
}

/// Response languages the prompts can request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Language {
    /// English (US)
    #[default]
    EnUs,
    /// English (UK)
    EnGb,
    /// Spanish
    Es,
    /// Mandarin
    Zh,
    /// Hindi
    Hi,
    /// Arabic
    Ar,
    /// French
    Fr,
    /// Russian
    Ru,
    /// Portuguese (Brazil)
    PtBr,
    /// Portuguese (Portugal)
    PtPt,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: [Self; 10] = [
        Self::EnUs,
        Self::EnGb,
        Self::Es,
        Self::Zh,
        Self::Hi,
        Self::Ar,
        Self::Fr,
        Self::Ru,
        Self::PtBr,
        Self::PtPt,
    ];

    /// BCP 47 style code used in configuration.
    pub fn code(self) -> &'static str {
        match self {
            Self::EnUs => "en-US",
            Self::EnGb => "en-GB",
            Self::Es => "es",
            Self::Zh => "zh",
            Self::Hi => "hi",
            Self::Ar => "ar",
            Self::Fr => "fr",
            Self::Ru => "ru",
            Self::PtBr => "pt-BR",
            Self::PtPt => "pt-PT",
        }
    }

    /// Human-readable name inserted into prompts.
    pub fn name(self) -> &'static str {
        match self {
            Self::EnUs => "English (US)",
            Self::EnGb => "English (UK)",
            Self::Es => "Spanish",
            Self::Zh => "Mandarin",
            Self::Hi => "Hindi",
            Self::Ar => "Arabic",
            Self::Fr => "French",
            Self::Ru => "Russian",
            Self::PtBr => "Portuguese (Brazil)",
            Self::PtPt => "Portuguese (Portugal)",
        }
    }

    /// Instruction asking the model to answer in this language.
    pub fn instruction(self) -> String {
        format!("Please respond entirely in {}.", self.name())
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.name())
    }
}

impl FromStr for Language {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|lang| lang.code().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| {
                let supported: Vec<String> =
                    Self::ALL.iter().map(|l| format!("  - {l}")).collect();
                anyhow::anyhow!(
                    "Invalid language code \"{s}\".\n\nSupported languages:\n{}",
                    supported.join("\n")
                )
            })
    }
}

/// Instruction prepended to every summarization request.
pub const SUMMARY_INSTRUCTION: &str = "Summarize the following content concisely and technically. \
Be direct and focus on the changes and their impact. \
Keep identifiers, code and quoted text in the language they are written in.";

/// Builds the request body for one summarization call.
pub fn generate_summary_prompt(language: Language, text: &str) -> String {
    format!("{}\n{SUMMARY_INSTRUCTION}\n\n{text}", language.instruction())
}

/// Prompt used for each chunk of an oversized diff.
pub fn chunk_summary_prompt(chunk: &str) -> String {
    format!(
        "Concisely and technically summarize the following diff excerpt \
         (answer in the same language as the content):\n\n{chunk}"
    )
}

/// Prompt used to compress the joined chunk summaries into one paragraph.
pub fn combine_summary_prompt(combined: &str) -> String {
    format!(
        "Summarize the following set of diff summaries succinctly and technically \
         in a single paragraph that captures the most important changes:\n\n{combined}"
    )
}

/// Renders the per-file diff section shared by both prompt types.
fn render_diffs(files: &[ChangedFile]) -> String {
    files
        .iter()
        .map(|file| format!("**{}:**\n```\n{}\n```", file.filename, file.diff))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Builds the final user prompt for a review or commit message request.
pub fn generate_prompt(
    files: &[ChangedFile],
    prompt_type: PromptType,
    language: Language,
) -> String {
    let diffs = render_diffs(files);
    let language_instruction = language.instruction();

    match prompt_type {
        PromptType::Analyze => format!(
            r#"Assume the role of a senior code reviewer.

Analyze in detail the following code changes (commits) provided:

{diffs}

Some files may contain a SUMMARY comment block instead of a raw diff; it is a technical summary of a change that was too large to include verbatim. Treat it as an accurate description of that file's changes.

For each modified file, organize your analysis as follows:

**File: [File Name]**

1.  **Detailed Summary of Modifications:**
    * What was the main objective and expected impact of the changes in this file?
    * Describe the main functionalities or logic that were added, removed, or significantly altered.

2.  **Identification of Errors, Potential Bugs, and Vulnerabilities:**
    * Are there logic errors, exception handling failures, race conditions, memory leaks, or other bugs?
    * Were security vulnerabilities introduced or neglected (e.g., SQL Injection, XSS, insecure input handling)?
    * For each identified item, quote the relevant code, explain the problem and describe its potential impact.

3.  **Improvement and Optimization Suggestions (with justifications):**
    * Can the code be refactored to increase clarity, readability, or maintainability?
    * Are there opportunities to optimize performance?
    * Can the testability of the code be improved? How?

4.  **Best Practices and Code Quality Recommendations:**
    * Evaluate naming, function size and responsibility, coupling and cohesion.
    * Does the code follow the language or project style conventions (if known)?
    * Are comments adequate?

**General Considerations about the Commit (if applicable):**
* Do the changes seem cohesive and aligned with a single objective, or do they mix different concerns?
* Are there broader implications for the system architecture or other modules?

Your analysis should be complete and specific, accurate and justified, constructive, and objective.

{language_instruction}"#
        ),
        PromptType::Create => format!(
            r#"Your task is to generate a commit title and commit message (body) that are accurate, informative, and follow version control best practices.

**Diffs:**
{diffs}

Some files may contain a SUMMARY comment block instead of a raw diff; it is a technical summary of a change that was too large to include verbatim.

**Internal Analysis Process:**
1.  Identify the central theme or main objective of the modifications.
2.  Determine exactly what was modified (functions, types, control flow, configuration).
3.  Infer why each change was made only from evidence in the diffs. If the reason is not evident, describe what was done instead of inventing a motivation.
4.  Consider how the changes affect behavior, performance, security, or maintainability.

**Commit Title:**
-   {language_instruction}
-   Start with a relevant emoji (🚀 new feature, ✨ improvement, 🐛 bug fix, 🔧 tooling, 📝 documentation, ♻️ refactoring, 🔒 security, 📈 performance).
-   Use an imperative verb at the beginning ("Add", "Fix", "Refactor", "Remove", "Update", "Improve").
-   Maximum of 50 characters.

**Commit Message (Body):**
-   {language_instruction}
-   Describe the main changes clearly, using bullet points or short paragraphs.
-   Explain the motivation and the expected impact when it can be inferred.

**Restrictions:**
-   Base the response strictly on the diffs. Do not invent information.
-   Do not paste large portions of the diffs.
-   Do not include personal or sensitive information.

**Response Format (exactly):**
Title

Message (body)"#
        ),
    }
}
