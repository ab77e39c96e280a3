//! Accept/reject decision for one candidate.
//!
//! Two independent signals are combined: the classifier verdict on the title,
//! and a structural heuristic over the extracted link. Under the default
//! [`DecisionPolicy::Either`] either signal alone accepts, which means each one
//! is its own source of false positives (any secure link into the news section
//! is accepted regardless of the title). [`DecisionPolicy::Both`] requires
//! agreement.

use crate::config::{DecisionConfig, DecisionPolicy};
use crate::models::{AcceptedBy, ExtractedRecord, FinalDecision, Verdict};

/// Pure function of `(record, verdict)` under a fixed configuration.
#[derive(Debug, Clone)]
pub struct DecisionEngine {
    policy: DecisionPolicy,
    secure_token: String,
    section_token: String,
}

impl DecisionEngine {
    pub fn new(config: &DecisionConfig) -> Self {
        Self {
            policy: config.policy,
            secure_token: config.secure_token.clone(),
            section_token: config.section_token.clone(),
        }
    }

    /// Title present, link present, link on secure transport and inside the
    /// news section.
    pub fn heuristic_holds(&self, record: &ExtractedRecord) -> bool {
        match (&record.title, &record.link) {
            (Some(_), Some(link)) => {
                link.contains(&self.secure_token) && link.contains(&self.section_token)
            }
            _ => false,
        }
    }

    /// Combine the classifier verdict with the link heuristic.
    ///
    /// # Arguments
    ///
    /// * `record` - The extracted candidate
    /// * `verdict` - The classifier's verdict on its normalized title
    ///
    /// # Returns
    ///
    /// The decision, with the signal that accepted it when it is accepted.
    pub fn decide(&self, record: &ExtractedRecord, verdict: &Verdict) -> FinalDecision {
        let model = verdict.is_news();
        let heuristic = self.heuristic_holds(record);

        let accepted = match self.policy {
            DecisionPolicy::Either => model || heuristic,
            DecisionPolicy::Both => model && heuristic,
        };
        let accepted_by = match (accepted, model, heuristic) {
            (false, _, _) => None,
            (true, true, true) => Some(AcceptedBy::Both),
            (true, true, false) => Some(AcceptedBy::Model),
            (true, false, _) => Some(AcceptedBy::Heuristic),
        };

        FinalDecision {
            accepted,
            accepted_by,
        }
    }
}
