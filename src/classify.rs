//! Summary classification into a closed set of product categories.
//!
//! The category keywords are only prompt context. The model decides the
//! label and its reply is used verbatim (trimmed); labels outside the set
//! are accepted as-is.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::llm::{BackendError, ChatBackend, ChatMessage};

/// Catch-all label for documents matching no category.
pub const UNCATEGORIZED: &str = "Uncategorized";

/// One product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    /// Representative keywords, passed to the model as context.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub keywords: Vec<String>,
    /// What a document in this category typically discusses, used for the
    /// worked example in the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub example: Option<String>,
}

impl Category {
    pub fn new(name: &str, keywords: &[&str], example: &str) -> Self {
        Self {
            name: name.to_string(),
            keywords: keywords.iter().map(|k| k.to_string()).collect(),
            example: Some(example.to_string()),
        }
    }

    /// Topic phrase for the worked example.
    fn example_topic(&self) -> String {
        match &self.example {
            Some(example) => example.clone(),
            None if !self.keywords.is_empty() => {
                let shown: Vec<&str> = self.keywords.iter().take(3).map(|k| k.as_str()).collect();
                shown.join(", ")
            }
            None => self.name.clone(),
        }
    }
}

/// Ordered set of categories, plus the implicit [`UNCATEGORIZED`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Category>", into = "Vec<Category>")]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl From<Vec<Category>> for CategorySet {
    fn from(categories: Vec<Category>) -> Self {
        Self::new(categories)
    }
}

impl From<CategorySet> for Vec<Category> {
    fn from(set: CategorySet) -> Self {
        set.categories
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        Self::new(vec![
            Category::new(
                "Omniverse",
                &["omniverse", "Omniverse", "digital twin", "rendering", "Kit", "Nucleus"],
                "3D rendering and digital twins",
            ),
            Category::new(
                "vGPU",
                &[
                    "vGPU",
                    "vWS",
                    "vPC",
                    "virtual GPU",
                    "GPU sharing",
                    "remote workstation",
                    "vGPU licensing",
                    "NVIDIA GRID",
                    "NVIDIA vComputeServer",
                    "virtualized graphics",
                    "GPU acceleration",
                    "remote desktop",
                    "vPC profiles",
                    "vApps",
                    "virtual workstation",
                    "graphics virtualization",
                ],
                "GPU virtualization, remote workstation, or virtualized graphics",
            ),
            Category::new(
                "NVAIE",
                &[
                    "Nvidia enterprise",
                    "NVAIE",
                    "AI infrastructure",
                    "cloud services",
                    "NVIDIA AI",
                ],
                "NVIDIA AI Enterprise, AI infrastructure, or enterprise AI cloud services",
            ),
        ])
    }
}

impl CategorySet {
    /// Build a set; an explicit "Uncategorized" entry is dropped since the
    /// catch-all is always present.
    pub fn new(categories: Vec<Category>) -> Self {
        Self {
            categories: categories
                .into_iter()
                .filter(|c| c.name != UNCATEGORIZED)
                .collect(),
        }
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Category names, without the catch-all.
    pub fn names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Every allowed label, ending with [`UNCATEGORIZED`].
    pub fn labels(&self) -> Vec<&str> {
        let mut labels = self.names();
        labels.push(UNCATEGORIZED);
        labels
    }

    /// System prompt instructing the model to answer with a bare label.
    pub fn system_prompt(&self) -> String {
        let quoted: Vec<String> = self.names().iter().map(|n| format!("'{}'", n)).collect();
        let labels = self.labels().join(", ");

        let mut prompt = format!(
            "You are an assistant that classifies documents into the following categories: [{}]. \
             Please only return the category name without any additional information. \
             The categories are: {}.\n",
            quoted.join(", "),
            labels
        );

        let keyword_lines: Vec<String> = self
            .categories
            .iter()
            .filter(|c| !c.keywords.is_empty())
            .map(|c| format!("{}: {}", c.name, c.keywords.join(", ")))
            .collect();
        if !keyword_lines.is_empty() {
            prompt.push_str("Keywords associated with each category: ");
            prompt.push_str(&keyword_lines.join("; "));
            prompt.push_str(".\n");
        }

        let mut examples: Vec<String> = self
            .categories
            .iter()
            .map(|c| {
                format!(
                    "If the document discusses {}, return '{}'.",
                    c.example_topic(),
                    c.name
                )
            })
            .collect();
        examples.push(format!(
            "If the document fits none of these categories or has no content, return '{}'.",
            UNCATEGORIZED
        ));
        if let Some(first) = examples.first_mut() {
            *first = format!("For example, i{}", &first[1..]);
        }
        prompt.push_str(&examples.join(" "));
        prompt.push('\n');

        prompt.push_str(&format!(
            "Make sure to only return one of the following words: {}. \
             No other text should be included in the response.",
            labels
        ));

        prompt
    }
}

/// Maps summaries to category labels using a configurable backend.
pub struct Classifier {
    backend: Box<dyn ChatBackend>,
    prompt: String,
}

impl Classifier {
    pub fn new(backend: Box<dyn ChatBackend>, categories: &CategorySet) -> Self {
        Self {
            backend,
            prompt: categories.system_prompt(),
        }
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Classify a summary. The trimmed reply is returned unvalidated.
    pub fn classify(&self, summary: &str) -> Result<String, BackendError> {
        let messages = vec![
            ChatMessage::system(self.prompt.as_str()),
            ChatMessage::user(summary),
        ];
        let label = self.backend.complete(&messages)?.trim().to_string();
        debug!("Model returned label '{}'", label);
        Ok(label)
    }
}
