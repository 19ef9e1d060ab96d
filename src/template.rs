use crate::error::{PlanError, PlanResult};
use crate::model::{build_interval, window_minutes, Employee};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::sync::RwLock;
use tracing::debug;

/// Définition réutilisable d'une vacation, indépendante de toute date.
///
/// `end <= start` encode une vacation de nuit (fin le lendemain). Une fois
/// référencé par une affectation, un template ne peut plus être modifié,
/// seulement désactivé ; les affectations gardent leurs champs en snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShiftTemplate {
    /// Code unique, majuscules ASCII, 2 à 10 caractères (ex. "MAT", "NUIT").
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default)]
    pub break_start: Option<NaiveTime>,
    #[serde(default)]
    pub break_end: Option<NaiveTime>,
    #[serde(default)]
    pub overtime_eligible: bool,
    pub active: bool,
    #[serde(default)]
    pub sort_order: u32,
    /// Posé par l'AssignmentStore à la première affectation.
    #[serde(default)]
    pub referenced: bool,
}

impl ShiftTemplate {
    pub fn validate(&self) -> PlanResult<()> {
        let code_ok = (2..=10).contains(&self.code.len())
            && self.code.chars().all(|c| c.is_ascii_uppercase());
        if !code_ok {
            return Err(PlanError::Validation(format!(
                "template code must be 2-10 uppercase ASCII letters, got {:?}",
                self.code
            )));
        }
        if self.name.trim().is_empty() {
            return Err(PlanError::Validation(
                "template name cannot be empty".to_string(),
            ));
        }
        if self.start == self.end {
            return Err(PlanError::Validation(
                "template window cannot be empty (start == end)".to_string(),
            ));
        }
        match (self.break_start, self.break_end) {
            (None, None) => {}
            (Some(bs), Some(be)) => {
                if window_minutes(bs, be) > self.duration_minutes() {
                    return Err(PlanError::Validation(
                        "break window exceeds the shift window".to_string(),
                    ));
                }
            }
            _ => {
                return Err(PlanError::Validation(
                    "break window requires both start and end".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Durée pleine de la vacation, pause comprise, minuit géré.
    pub fn duration_minutes(&self) -> i64 {
        window_minutes(self.start, self.end)
    }

    pub fn break_minutes(&self) -> i64 {
        match (self.break_start, self.break_end) {
            (Some(bs), Some(be)) => window_minutes(bs, be),
            _ => 0,
        }
    }

    /// Chevauchement de fenêtres horaires en secondes-depuis-minuit,
    /// les fenêtres de nuit étant dépliées sur le lendemain.
    pub fn window_overlaps(&self, start: NaiveTime, end: NaiveTime) -> bool {
        let (a_start, a_end) = window_bounds_seconds(self.start, self.end);
        let (b_start, b_end) = window_bounds_seconds(start, end);
        a_start < b_end && b_start < a_end
    }
}

fn window_bounds_seconds(start: NaiveTime, end: NaiveTime) -> (i64, i64) {
    use chrono::Timelike;
    let start_secs = i64::from(start.num_seconds_from_midnight());
    let mut end_secs = i64::from(end.num_seconds_from_midnight());
    if end <= start {
        end_secs += 24 * 60 * 60;
    }
    (start_secs, end_secs)
}

/// Paramètres de création d'un template.
#[derive(Debug, Clone)]
pub struct NewTemplate {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub break_start: Option<NaiveTime>,
    pub break_end: Option<NaiveTime>,
    pub overtime_eligible: bool,
    pub sort_order: u32,
}

/// Champs modifiables d'un template non référencé.
#[derive(Debug, Clone, Default)]
pub struct TemplateUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub break_start: Option<Option<NaiveTime>>,
    pub break_end: Option<Option<NaiveTime>>,
    pub overtime_eligible: Option<bool>,
    pub sort_order: Option<u32>,
}

/// Catalogue canonique des templates. Lecture majoritaire, verrou simple.
#[derive(Debug, Default)]
pub struct TemplateCatalog {
    templates: RwLock<Vec<ShiftTemplate>>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_templates(templates: Vec<ShiftTemplate>) -> Self {
        Self {
            templates: RwLock::new(templates),
        }
    }

    pub fn create(&self, spec: NewTemplate) -> PlanResult<ShiftTemplate> {
        let template = ShiftTemplate {
            code: spec.code,
            name: spec.name,
            description: spec.description,
            start: spec.start,
            end: spec.end,
            break_start: spec.break_start,
            break_end: spec.break_end,
            overtime_eligible: spec.overtime_eligible,
            active: true,
            sort_order: spec.sort_order,
            referenced: false,
        };
        template.validate()?;
        let mut templates = self.templates.write().expect("catalog lock poisoned");
        if templates.iter().any(|t| t.code == template.code) {
            return Err(PlanError::Validation(format!(
                "template code {} already exists",
                template.code
            )));
        }
        debug!(code = %template.code, "template created");
        templates.push(template.clone());
        Ok(template)
    }

    /// Modifie un template jamais référencé. Un template référencé est figé,
    /// seule la désactivation reste permise.
    pub fn update(&self, code: &str, update: TemplateUpdate) -> PlanResult<ShiftTemplate> {
        let mut templates = self.templates.write().expect("catalog lock poisoned");
        let template = templates
            .iter_mut()
            .find(|t| t.code == code)
            .ok_or_else(|| PlanError::NotFound(format!("template {code}")))?;
        if template.referenced {
            return Err(PlanError::InvalidTransition(
                "a referenced template can only be deactivated",
            ));
        }
        let mut candidate = template.clone();
        if let Some(name) = update.name {
            candidate.name = name;
        }
        if let Some(description) = update.description {
            candidate.description = description;
        }
        if let Some(start) = update.start {
            candidate.start = start;
        }
        if let Some(end) = update.end {
            candidate.end = end;
        }
        if let Some(bs) = update.break_start {
            candidate.break_start = bs;
        }
        if let Some(be) = update.break_end {
            candidate.break_end = be;
        }
        if let Some(flag) = update.overtime_eligible {
            candidate.overtime_eligible = flag;
        }
        if let Some(order) = update.sort_order {
            candidate.sort_order = order;
        }
        candidate.validate()?;
        *template = candidate.clone();
        Ok(candidate)
    }

    /// Désactivation, jamais de suppression : les affectations existantes
    /// restent valides via leurs champs snapshot.
    pub fn deactivate(&self, code: &str) -> PlanResult<()> {
        let mut templates = self.templates.write().expect("catalog lock poisoned");
        let template = templates
            .iter_mut()
            .find(|t| t.code == code)
            .ok_or_else(|| PlanError::NotFound(format!("template {code}")))?;
        template.active = false;
        debug!(code, "template deactivated");
        Ok(())
    }

    pub fn get(&self, code: &str) -> Option<ShiftTemplate> {
        self.templates
            .read()
            .expect("catalog lock poisoned")
            .iter()
            .find(|t| t.code == code)
            .cloned()
    }

    pub fn list_active(&self) -> Vec<ShiftTemplate> {
        let mut out: Vec<ShiftTemplate> = self
            .templates
            .read()
            .expect("catalog lock poisoned")
            .iter()
            .filter(|t| t.active)
            .cloned()
            .collect();
        out.sort_by(|a, b| a.sort_order.cmp(&b.sort_order).then(a.code.cmp(&b.code)));
        out
    }

    /// Templates actifs dont la fenêtre chevauche [start, end) : sert à
    /// avertir d'un quasi-doublon avant d'en créer un nouveau.
    pub fn find_overlapping(&self, start: NaiveTime, end: NaiveTime) -> Vec<ShiftTemplate> {
        self.templates
            .read()
            .expect("catalog lock poisoned")
            .iter()
            .filter(|t| t.active && t.window_overlaps(start, end))
            .cloned()
            .collect()
    }

    /// Templates proposables à un employé un jour donné : actifs, et dont la
    /// fenêtre ne tombe pas dans une période d'indisponibilité.
    pub fn available_for(&self, employee: &Employee, date: NaiveDate) -> Vec<ShiftTemplate> {
        self.list_active()
            .into_iter()
            .filter(|t| {
                let (start, end) = build_interval(date, t.start, t.end);
                !employee
                    .vacations
                    .iter()
                    .any(|v| start < v.end && v.start < end)
            })
            .collect()
    }

    /// Marque un template comme référencé par au moins une affectation.
    pub fn mark_referenced(&self, code: &str) {
        let mut templates = self.templates.write().expect("catalog lock poisoned");
        if let Some(t) = templates.iter_mut().find(|t| t.code == code) {
            t.referenced = true;
        }
    }

    pub fn snapshot(&self) -> Vec<ShiftTemplate> {
        self.templates
            .read()
            .expect("catalog lock poisoned")
            .clone()
    }
}
