//! Starter content: cloud focus, feature cards, modules and topic suggestions.

use std::fmt;
use std::str::FromStr;

/// Which provider the tutor should concentrate on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum CloudFocus {
    /// No single provider; compare across clouds.
    #[default]
    Multi,
    /// Amazon Web Services.
    Aws,
    /// Microsoft Azure.
    Azure,
    /// Google Cloud Platform.
    Gcp,
}

impl CloudFocus {
    /// Every focus, in menu order.
    pub const ALL: [CloudFocus; 4] = [
        CloudFocus::Multi,
        CloudFocus::Aws,
        CloudFocus::Azure,
        CloudFocus::Gcp,
    ];

    /// The display name, as used in the context prefix.
    pub fn name(&self) -> &'static str {
        match self {
            CloudFocus::Multi => "Multi",
            CloudFocus::Aws => "AWS",
            CloudFocus::Azure => "Azure",
            CloudFocus::Gcp => "GCP",
        }
    }

    /// Prefixes `prompt` with the provider context. `Multi` leaves it unchanged.
    pub fn apply(&self, prompt: &str) -> String {
        match self {
            CloudFocus::Multi => prompt.to_string(),
            _ => format!(
                "[Context: Focus specifically on {} implementations] {prompt}",
                self.name()
            ),
        }
    }
}

impl fmt::Display for CloudFocus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Error returned when a cloud focus name is not recognized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCloud(pub String);

impl fmt::Display for UnknownCloud {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "unknown cloud '{}' (expected multi, aws, azure or gcp)",
            self.0
        )
    }
}

impl std::error::Error for UnknownCloud {}

impl FromStr for CloudFocus {
    type Err = UnknownCloud;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "multi" | "all" => Ok(CloudFocus::Multi),
            "aws" => Ok(CloudFocus::Aws),
            "azure" => Ok(CloudFocus::Azure),
            "gcp" | "google" => Ok(CloudFocus::Gcp),
            _ => Err(UnknownCloud(s.trim().to_string())),
        }
    }
}

/// A starter card shown before the session begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feature {
    /// Card title.
    pub title: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// The prompt sent when the card is chosen.
    pub prompt: &'static str,
}

/// The four starter cards.
pub const FEATURES: [Feature; 4] = [
    Feature {
        title: "Pattern Focused",
        description: "WhatsApp, Netflix, and Uber architectures.",
        prompt: "I want to learn about architectures for big apps like WhatsApp, Netflix, and Uber.",
    },
    Feature {
        title: "Multi-Cloud",
        description: "Native mappings for AWS, GCP, and Azure.",
        prompt: "Help me understand how services map across AWS, GCP, and Azure.",
    },
    Feature {
        title: "MLOps Lifecycle",
        description: "Automate machine learning pipelines and serving.",
        prompt: "Tell me about MLOps pipelines and serving patterns.",
    },
    Feature {
        title: "Hands-on Labs",
        description: "Conceptual labs using open public datasets.",
        prompt: "I'm interested in hands-on labs with sample data.",
    },
];

/// The prompt for a landing-screen choice.
///
/// A starter card number (1-4) or title, ignoring case, selects that card's
/// prompt; any other text is used as typed.
pub fn starter_prompt(topic: &str) -> String {
    let topic = topic.trim();
    topic
        .parse::<usize>()
        .ok()
        .and_then(|number| number.checked_sub(1))
        .and_then(|index| FEATURES.get(index))
        .or_else(|| {
            FEATURES
                .iter()
                .find(|feature| feature.title.eq_ignore_ascii_case(topic))
        })
        .map_or_else(|| topic.to_string(), |feature| feature.prompt.to_string())
}

/// Sidebar learning modules.
pub const MODULES: [&str; 4] = [
    "Cloud Fundamentals",
    "Migration Workflow",
    "MLOps Lifecycle",
    "System Design",
];

/// The prompt sent when a module is chosen.
pub fn module_prompt(label: &str) -> String {
    format!("Explain {label} in depth.")
}

const SUGGESTIONS: [&str; 5] = [
    "AWS Lambda vs GCP Functions",
    "S3 Storage Classes",
    "Cloud Migration 7R Strategy",
    "Kubernetes Multi-Cloud Deployment",
    "SageMaker Training Pipelines",
];

/// Topic suggestions whose text contains `query`, ignoring case.
pub fn search_suggestions(query: &str) -> Vec<&'static str> {
    let query = query.trim().to_lowercase();
    SUGGESTIONS
        .iter()
        .copied()
        .filter(|suggestion| suggestion.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn focus_prefix() {
        assert_eq!(CloudFocus::Multi.apply("What is IAM?"), "What is IAM?");
        assert_eq!(
            CloudFocus::Aws.apply("What is IAM?"),
            "[Context: Focus specifically on AWS implementations] What is IAM?"
        );
        assert_eq!(
            CloudFocus::Gcp.apply("x"),
            "[Context: Focus specifically on GCP implementations] x"
        );
    }

    #[test]
    fn focus_parsing() {
        assert_eq!("AWS".parse::<CloudFocus>(), Ok(CloudFocus::Aws));
        assert_eq!(" azure ".parse::<CloudFocus>(), Ok(CloudFocus::Azure));
        assert_eq!("multi".parse::<CloudFocus>(), Ok(CloudFocus::Multi));
        assert_eq!(
            "oracle".parse::<CloudFocus>(),
            Err(UnknownCloud("oracle".to_string()))
        );
        for focus in CloudFocus::ALL {
            assert_eq!(focus.to_string().parse::<CloudFocus>(), Ok(focus));
        }
    }

    #[test]
    fn starter_prompts() {
        assert_eq!(starter_prompt("1"), FEATURES[0].prompt);
        assert_eq!(starter_prompt(" mlops lifecycle "), FEATURES[2].prompt);
        assert_eq!(starter_prompt("0"), "0");
        assert_eq!(starter_prompt("S3 Storage Classes"), "S3 Storage Classes");
    }

    #[test]
    fn module_prompts() {
        assert_eq!(
            module_prompt(MODULES[1]),
            "Explain Migration Workflow in depth."
        );
    }

    #[test]
    fn suggestions_filter() {
        assert_eq!(search_suggestions("").len(), 5);
        assert_eq!(
            search_suggestions("PIPELINES"),
            vec!["SageMaker Training Pipelines"]
        );
        assert_eq!(
            search_suggestions("cloud"),
            vec!["Cloud Migration 7R Strategy", "Kubernetes Multi-Cloud Deployment"]
        );
        assert!(search_suggestions("mainframe").is_empty());
    }
}
