/*!
 * Prompt preambles placed in front of the aggregated output
 */

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Built-in prompt templates
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    ValueEnum,
    EnumIter,
    EnumString,
    Display,
    Serialize,
    Deserialize,
)]
#[value(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    /// Ask for a diagnosis and a fix of a reported error
    ErrorFixing,
    /// Ask for an explanation of the project
    ExplainToAi,
    /// Ask for a plan and code for a new feature
    AddingNewFeature,
    /// Ask for a commit message describing the changes
    AutoCommiter,
}

impl PromptTemplate {
    /// Preamble text
    pub fn text(&self) -> &'static str {
        match self {
            Self::ErrorFixing => {
                "You are an experienced software engineer. Below is the structure and source of a project \
                 that currently fails. Find the root cause of the error, explain it briefly, and propose the \
                 smallest change that fixes it. Show the corrected code for every file you touch."
            }
            Self::ExplainToAi => {
                "Below is the structure and source of a project. Read all of it, then explain what the \
                 project does, how its main parts fit together, and where a newcomer should start reading."
            }
            Self::AddingNewFeature => {
                "Below is the structure and source of a project. I want to add a new feature that I will \
                 describe after this context. Follow the existing conventions of the code, list the files to \
                 change or create, and give the complete code for each of them."
            }
            Self::AutoCommiter => {
                "Below is the structure and source of a project after my latest changes. Write a concise git \
                 commit message for them: a summary line under 72 characters, a blank line, then a short \
                 body describing what changed."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    #[test]
    fn test_names_round_trip() {
        for template in PromptTemplate::iter() {
            let name = template.to_string();
            assert_eq!(<PromptTemplate as FromStr>::from_str(&name).unwrap(), template);
            assert_eq!(<PromptTemplate as ValueEnum>::from_str(&name, true).unwrap(), template);
            assert!(!template.text().is_empty());
        }
        assert_eq!(PromptTemplate::AutoCommiter.to_string(), "auto_commiter");
    }

    #[test]
    fn test_clap_names() {
        let parsed = <PromptTemplate as ValueEnum>::from_str("explain_to_ai", false).unwrap();
        assert_eq!(parsed, PromptTemplate::ExplainToAi);
    }
}
