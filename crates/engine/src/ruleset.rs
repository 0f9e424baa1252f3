use pulsewatch_common::clock::next_rule_id;
use pulsewatch_common::types::{AlertRule, Condition, MetricKind};

/// The built-in rule set used when nothing has been configured. A pure
/// factory: callers own the returned rules, and edits never touch the
/// originals.
pub fn default_rules() -> Vec<AlertRule> {
    vec![
        AlertRule {
            id: "default-growth".into(),
            name: "Growth Spike".into(),
            kind: MetricKind::Growth,
            condition: Condition::GreaterThan,
            threshold: 15.0,
            enabled: true,
            color: "#22c55e".into(),
            icon: "trending-up".into(),
        },
        AlertRule {
            id: "default-engagement".into(),
            name: "Low Engagement".into(),
            kind: MetricKind::Engagement,
            condition: Condition::LessThan,
            threshold: 3.0,
            enabled: true,
            color: "#f59e0b".into(),
            icon: "activity".into(),
        },
        AlertRule {
            id: "default-subscribers".into(),
            name: "Subscriber Milestone".into(),
            kind: MetricKind::Subscribers,
            condition: Condition::Milestone,
            threshold: 1000.0,
            enabled: true,
            color: "#8b5cf6".into(),
            icon: "users".into(),
        },
        AlertRule {
            id: "default-views".into(),
            name: "View Surge".into(),
            kind: MetricKind::Views,
            condition: Condition::Surge,
            threshold: 10_000.0,
            enabled: true,
            color: "#3b82f6".into(),
            icon: "eye".into(),
        },
    ]
}

/// Draft for [`RuleSet::add`]; the set assigns the id.
#[derive(Debug, Clone)]
pub struct NewRule {
    pub name: String,
    pub kind: MetricKind,
    pub condition: Condition,
    pub threshold: f64,
    pub color: String,
    pub icon: String,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RuleError {
    EmptyName,
}

impl std::fmt::Display for RuleError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyName => write!(f, "rule name must not be empty"),
        }
    }
}

impl std::error::Error for RuleError {}

#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<AlertRule>,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            rules: default_rules(),
        }
    }
}

impl RuleSet {
    pub fn new(rules: Vec<AlertRule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn get(&self, id: &str) -> Option<&AlertRule> {
        self.rules.iter().find(|r| r.id == id)
    }

    /// Flip `enabled` on the matching rule. Unknown ids are a no-op, not an
    /// error: the rule may have been removed by a concurrent edit.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.rules.iter_mut().find(|r| r.id == id) {
            Some(rule) => {
                rule.enabled = !rule.enabled;
                true
            }
            None => false,
        }
    }

    /// Append a rule with a freshly generated id. Blank names are rejected
    /// back to the caller; the set stays unchanged.
    pub fn add(&mut self, draft: NewRule) -> Result<AlertRule, RuleError> {
        if draft.name.trim().is_empty() {
            return Err(RuleError::EmptyName);
        }
        let rule = AlertRule {
            id: next_rule_id(),
            name: draft.name,
            kind: draft.kind,
            condition: draft.condition,
            threshold: draft.threshold,
            enabled: true,
            color: draft.color,
            icon: draft.icon,
        };
        self.rules.push(rule.clone());
        Ok(rule)
    }

    /// Remove a rule by id. Returns whether anything was removed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.rules.len();
        self.rules.retain(|r| r.id != id);
        self.rules.len() < before
    }
}
