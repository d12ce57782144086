//! The question catalog: ordered pillars plus the shared maturity scale.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::error::CatalogError;
use crate::model::{MaturityLevel, Pillar, Question};

/// An immutable, validated question catalog.
///
/// Construction checks every structural invariant the scoring engine and
/// the wizard rely on, so holders of a `Catalog` never re-validate.
#[derive(Debug, Clone, Serialize)]
pub struct Catalog {
    id: String,
    name: String,
    pillars: Vec<Pillar>,
    levels: Vec<MaturityLevel>,
    #[serde(skip)]
    index: HashMap<String, (usize, usize)>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids, empty pillars, non-positive
    /// weights, and a maturity scale that is not exactly `1..=L_max`.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        pillars: Vec<Pillar>,
        levels: Vec<MaturityLevel>,
    ) -> Result<Self, CatalogError> {
        check_structure(&pillars, &levels)?;
        Ok(Self::assemble(id.into(), name.into(), pillars, levels))
    }

    fn assemble(id: String, name: String, pillars: Vec<Pillar>, levels: Vec<MaturityLevel>) -> Self {
        let index = pillars
            .iter()
            .enumerate()
            .flat_map(|(p, pillar)| {
                pillar
                    .questions
                    .iter()
                    .enumerate()
                    .map(move |(q, question)| (question.id.clone(), (p, q)))
            })
            .collect();
        Self {
            id,
            name,
            pillars,
            levels,
            index,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Pillars in traversal order.
    pub fn pillars(&self) -> &[Pillar] {
        &self.pillars
    }

    pub fn pillar(&self, index: usize) -> Option<&Pillar> {
        self.pillars.get(index)
    }

    pub fn pillar_count(&self) -> usize {
        self.pillars.len()
    }

    pub fn last_pillar_index(&self) -> usize {
        self.pillars.len().saturating_sub(1)
    }

    /// Maturity levels in ascending order.
    pub fn levels(&self) -> &[MaturityLevel] {
        &self.levels
    }

    pub fn level(&self, value: u8) -> Option<&MaturityLevel> {
        self.levels.iter().find(|l| l.value == value)
    }

    /// The highest maturity level value (L_max).
    pub fn max_level(&self) -> u8 {
        self.levels.last().map(|l| l.value).unwrap_or(0)
    }

    pub fn is_valid_level(&self, value: u8) -> bool {
        (1..=self.max_level()).contains(&value)
    }

    /// Look up a question and the index of the pillar that owns it.
    pub fn question(&self, question_id: &str) -> Option<(usize, &Question)> {
        let &(p, q) = self.index.get(question_id)?;
        Some((p, &self.pillars[p].questions[q]))
    }

    pub fn question_count(&self) -> usize {
        self.index.len()
    }

    /// The built-in cybersecurity posture catalog (CSPR v3 / NIST CSF 2.0).
    pub fn builtin() -> Self {
        Self::assemble(
            "cspr-nist-csf".into(),
            "Cybersecurity Posture (CSPR v3 & NIST CSF 2.0)".into(),
            builtin_pillars(),
            builtin_levels(),
        )
    }
}

fn check_structure(pillars: &[Pillar], levels: &[MaturityLevel]) -> Result<(), CatalogError> {
    if pillars.is_empty() {
        return Err(CatalogError::NoPillars);
    }

    if levels.is_empty() {
        return Err(CatalogError::InvalidLevels("no maturity levels defined".into()));
    }
    for (i, level) in levels.iter().enumerate() {
        let expected = i + 1;
        if usize::from(level.value) != expected {
            return Err(CatalogError::InvalidLevels(format!(
                "levels must be exactly 1..={} in ascending order, found {} at position {}",
                levels.len(),
                level.value,
                expected
            )));
        }
    }

    let mut pillar_ids = HashSet::new();
    let mut question_ids = HashSet::new();
    for pillar in pillars {
        if !pillar_ids.insert(pillar.id.as_str()) {
            return Err(CatalogError::DuplicatePillar(pillar.id.clone()));
        }
        if pillar.questions.is_empty() {
            return Err(CatalogError::EmptyPillar(pillar.id.clone()));
        }
        for question in &pillar.questions {
            if !question_ids.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateQuestion(question.id.clone()));
            }
            if question.weight == 0 {
                return Err(CatalogError::InvalidWeight {
                    question: question.id.clone(),
                    weight: 0,
                });
            }
        }
    }

    Ok(())
}

fn q(id: &str, text: &str, weight: u32) -> Question {
    Question {
        id: id.into(),
        text: text.into(),
        weight,
    }
}

fn pillar(id: &str, name: &str, icon: &str, questions: Vec<Question>) -> Pillar {
    Pillar {
        id: id.into(),
        name: name.into(),
        icon: icon.into(),
        questions,
    }
}

fn builtin_pillars() -> Vec<Pillar> {
    vec![
        pillar(
            "GOVERN",
            "Governance & Strategy",
            "shield",
            vec![
                q("G1", "Is security treated as a cross-cutting process with its own budget rather than as technical support?", 5),
                q("G2", "Have recovery time (RTO) and data loss (RPO) objectives been formalised through an up-to-date BIA?", 5),
                q("G3", "Is there a cybersecurity roadmap aligned with the strategic growth of the business?", 4),
            ],
        ),
        pillar(
            "CLOUD_IDENTITY",
            "Cloud Identity & IAM (CSPR v3)",
            "cloud",
            vec![
                q("CI1", "Are Super Admin permissions granted only to dedicated accounts kept separate from daily use?", 5),
                q("CI2", "Is Domain Restricted Sharing enforced across the cloud organisation?", 4),
                q("CI3", "Are service account keys audited periodically to prevent exposure in repositories?", 5),
            ],
        ),
        pillar(
            "PERIMETER",
            "Perimeter Security",
            "eye",
            vec![
                q("P1", "Is there an automated inventory of assets covering IPs, TLS certificates and multi-cloud services?", 5),
                q("P2", "Are hardening controls (WAF, IPS, closed ports) applied to every internet-facing service?", 4),
                q("P3", "Are on-premise to cloud links encrypted and subject to active traffic inspection?", 4),
            ],
        ),
        pillar(
            "PROTECT",
            "Data Protection & Access",
            "lock",
            vec![
                q("PR1", "Is MFA required for all remote connections (VPN, RDP) and administration consoles?", 5),
                q("PR2", "Is sensitive cloud data classified and protected by exfiltration controls?", 5),
                q("PR3", "Are penetration tests run periodically to find exploitable vulnerabilities?", 4),
            ],
        ),
        pillar(
            "DETECT_RESPOND",
            "Detection & Response",
            "activity",
            vec![
                q("DR1", "Is there 24/7 monitoring (SOC) with centralised log visibility (SIEM) to detect anomalies?", 5),
                q("DR2", "Does the IT team know its role and follow documented procedures during an incident?", 4),
                q("DR3", "Are KPIs such as mean time to detect (MTTD) and mean time to respond (MTTR) measured?", 3),
            ],
        ),
        pillar(
            "RECOVER",
            "Recovery & Immutability",
            "refresh",
            vec![
                q("R1", "Are there immutable backups specifically protected against ransomware?", 5),
                q("R2", "Is the disaster recovery plan (DRP) restore-tested at least once a year?", 5),
                q("R3", "Is there a continuous awareness programme with metrics (e.g. fewer clicks on simulated phishing)?", 3),
            ],
        ),
    ]
}

fn builtin_levels() -> Vec<MaturityLevel> {
    let level = |value: u8, label: &str, description: &str| MaturityLevel {
        value,
        label: label.into(),
        description: description.into(),
    };
    vec![
        level(1, "Nonexistent", "No process or tooling. Maximum risk."),
        level(2, "Initial", "Reactive, undocumented processes."),
        level(3, "Defined", "Documented policies and basic tooling."),
        level(4, "Optimized", "Continuous monitoring and improvement."),
    ]
}
