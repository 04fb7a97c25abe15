//! Rule-based recommendation selection
//!
//! Global invariants enforced:
//! - Selection is threshold-based over fixed text banks
//! - No randomness; identical input yields identical, identically ordered output
//! - Output is truncated to the configured limit

use crate::service::{Readiness, ServiceScores};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Default number of recommendations returned
pub const DEFAULT_LIMIT: usize = 5;

/// Services above this vulnerability always get a dedicated recommendation
pub const SERVICE_VULNERABILITY_TRIGGER: f64 = 70.0;

/// Impact or effort rating
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

/// Score tier driving the general recommendation bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Foundation,
    Acceleration,
    Optimization,
}

/// Tier for an overall score: < 40 foundation, 40..=70 acceleration, > 70 optimization
pub fn tier_for(overall: f64) -> Tier {
    if overall < 40.0 {
        Tier::Foundation
    } else if overall <= 70.0 {
        Tier::Acceleration
    } else {
        Tier::Optimization
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    pub impact: Level,
    pub effort: Level,
    /// Service the recommendation addresses, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<String>,
}

struct Template {
    title: &'static str,
    description: &'static str,
    impact: Level,
    effort: Level,
}

impl Template {
    fn build(&self, service: Option<&str>) -> Recommendation {
        Recommendation {
            title: self.title.to_string(),
            description: self.description.to_string(),
            impact: self.impact,
            effort: self.effort,
            service: service.map(str::to_string),
        }
    }
}

const FOUNDATION: &[Template] = &[
    Template {
        title: "Document core workflows",
        description: "Map and document your highest-volume delivery workflows so they can be measured, standardised and later automated.",
        impact: Level::High,
        effort: Level::Low,
    },
    Template {
        title: "Run a guided AI pilot",
        description: "Pick one repetitive, low-risk task and trial an AI assistant on it for four weeks with a named owner and clear success criteria.",
        impact: Level::High,
        effort: Level::Medium,
    },
    Template {
        title: "Establish baseline metrics",
        description: "Track utilisation, turnaround time and margin per service so improvements from automation can be quantified.",
        impact: Level::Medium,
        effort: Level::Low,
    },
    Template {
        title: "Set an AI usage policy",
        description: "Agree which tools may be used, with which client data, and how AI-assisted work is reviewed before delivery.",
        impact: Level::Medium,
        effort: Level::Low,
    },
];

const ACCELERATION: &[Template] = &[
    Template {
        title: "Scale proven AI workflows",
        description: "Roll the AI-assisted workflows that worked in pilots out to every team delivering the same service.",
        impact: Level::High,
        effort: Level::Medium,
    },
    Template {
        title: "Reprice around outcomes",
        description: "Move hourly and retainer pricing toward outcome- or value-based packages so efficiency gains are retained as margin.",
        impact: Level::High,
        effort: Level::High,
    },
    Template {
        title: "Upskill delivery teams",
        description: "Give every team a structured AI training path and pair less confident staff with internal champions.",
        impact: Level::Medium,
        effort: Level::Medium,
    },
    Template {
        title: "Integrate data sources",
        description: "Connect reporting, CRM and project data so AI tooling works from a single reliable source.",
        impact: Level::Medium,
        effort: Level::High,
    },
];

const OPTIMIZATION: &[Template] = &[
    Template {
        title: "Productise AI capabilities",
        description: "Package your internal AI workflows into named, repeatable offerings that differentiate you from competitors.",
        impact: Level::High,
        effort: Level::Medium,
    },
    Template {
        title: "Build proprietary data assets",
        description: "Capture benchmarks and performance data from delivery work to create defensible, data-driven services.",
        impact: Level::High,
        effort: Level::High,
    },
    Template {
        title: "Prepare for valuation",
        description: "Document recurring revenue, margins and AI-enabled processes so buyers and investors can price them in.",
        impact: Level::Medium,
        effort: Level::Low,
    },
];

const SERVICE_BANK: &[(&str, Template)] = &[
    (
        "content_creation",
        Template {
            title: "Shift content creation to AI-assisted production",
            description: "Use AI for first drafts and variations, and reposition writers as editors and strategists to protect margin.",
            impact: Level::High,
            effort: Level::Medium,
        },
    ),
    (
        "content_production",
        Template {
            title: "Automate routine content production",
            description: "Template briefs and let AI produce first drafts, freeing the team for campaign-level creative work.",
            impact: Level::High,
            effort: Level::Low,
        },
    ),
    (
        "seo",
        Template {
            title: "Move SEO from production to strategy",
            description: "Automate keyword research and on-page audits, and sell technical and search-experience strategy instead of volume.",
            impact: Level::High,
            effort: Level::Medium,
        },
    ),
    (
        "paid_media",
        Template {
            title: "Lean into automated bidding",
            description: "Let platform automation handle bids and creative testing, and focus the team on measurement and budget strategy.",
            impact: Level::Medium,
            effort: Level::Low,
        },
    ),
    (
        "campaign_management",
        Template {
            title: "Automate campaign operations",
            description: "Use AI for audience building, reporting and creative variants so campaign managers focus on planning.",
            impact: Level::Medium,
            effort: Level::Medium,
        },
    ),
    (
        "social_media",
        Template {
            title: "Reposition social media around community",
            description: "Automate scheduling and post variants, and sell community management and creator partnerships.",
            impact: Level::Medium,
            effort: Level::Low,
        },
    ),
    (
        "social_media_management",
        Template {
            title: "Automate social scheduling and listening",
            description: "Hand scheduling, tagging and sentiment summaries to AI tooling and keep humans on engagement.",
            impact: Level::Medium,
            effort: Level::Low,
        },
    ),
    (
        "web_development",
        Template {
            title: "Adopt AI-assisted development",
            description: "Introduce AI code assistants and component libraries to cut build time on standard sites.",
            impact: Level::Medium,
            effort: Level::Medium,
        },
    ),
    (
        "analytics_reporting",
        Template {
            title: "Replace manual reporting with automated insight",
            description: "Automate recurring reports and sell interpretation and recommendations rather than dashboards.",
            impact: Level::High,
            effort: Level::Low,
        },
    ),
    (
        "marketing_analytics",
        Template {
            title: "Automate marketing reporting",
            description: "Generate recurring reports automatically and spend analyst time on experiments and attribution.",
            impact: Level::High,
            effort: Level::Low,
        },
    ),
    (
        "creative_design",
        Template {
            title: "Use generative tools for design iterations",
            description: "Use generative design for concepts and resizes while senior designers own brand and art direction.",
            impact: Level::Medium,
            effort: Level::Medium,
        },
    ),
    (
        "email_marketing",
        Template {
            title: "Personalise email at scale",
            description: "Use AI segmentation and copy variants to personalise lifecycle email without growing the team.",
            impact: Level::Medium,
            effort: Level::Low,
        },
    ),
];

fn tier_bank(tier: Tier) -> &'static [Template] {
    match tier {
        Tier::Foundation => FOUNDATION,
        Tier::Acceleration => ACCELERATION,
        Tier::Optimization => OPTIMIZATION,
    }
}

/// Turn a service id like `paid_media` into `paid media`
fn humanize(service_id: &str) -> String {
    service_id.replace(['_', '-'], " ")
}

fn service_recommendation(service_id: &str) -> Recommendation {
    match SERVICE_BANK.iter().find(|(id, _)| *id == service_id) {
        Some((_, template)) => template.build(Some(service_id)),
        None => {
            let name = humanize(service_id);
            Recommendation {
                title: format!("Reduce AI exposure in {}", name),
                description: format!(
                    "Identify which parts of {} can be automated, automate them first, and reposition the remaining work around advice and quality control.",
                    name
                ),
                impact: Level::High,
                effort: Level::Medium,
                service: Some(service_id.to_string()),
            }
        }
    }
}

/// Select recommendations for an overall score and the mapped services
///
/// Service-specific entries for exposed or low-readiness services come first,
/// most vulnerable first, followed by the general bank for the score tier.
pub fn select(overall: f64, services: &ServiceScores, limit: usize) -> Vec<Recommendation> {
    let mut selected = Vec::new();
    let mut seen = HashSet::new();

    let exposed = services.by_vulnerability().into_iter().filter(|(_, s)| {
        s.vulnerability > SERVICE_VULNERABILITY_TRIGGER || s.readiness == Readiness::Low
    });
    for (service_id, _) in exposed {
        let rec = service_recommendation(service_id);
        if seen.insert(rec.title.clone()) {
            selected.push(rec);
        }
    }

    for template in tier_bank(tier_for(overall)) {
        if seen.insert(template.title.to_string()) {
            selected.push(template.build(None));
        }
    }

    selected.truncate(limit);
    selected
}
