#![forbid(unsafe_code)]
use chrono::NaiveTime;
use roulement::template::{NewTemplate, TemplateCatalog, TemplateUpdate};
use roulement::PlanError;

fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

fn morning() -> NewTemplate {
    NewTemplate {
        code: "MAT".to_string(),
        name: "Matin".to_string(),
        description: None,
        start: t(6, 0),
        end: t(14, 0),
        break_start: None,
        break_end: None,
        overtime_eligible: false,
        sort_order: 0,
    }
}

#[test]
fn create_and_list_active() {
    let catalog = TemplateCatalog::new();
    catalog.create(morning()).unwrap();
    let mut night = morning();
    night.code = "NUIT".to_string();
    night.name = "Nuit".to_string();
    night.start = t(22, 0);
    night.end = t(6, 0);
    night.sort_order = 2;
    catalog.create(night).unwrap();

    let active = catalog.list_active();
    assert_eq!(active.len(), 2);
    assert_eq!(active[0].code, "MAT");
    // vacation de nuit : 8h malgré end < start
    assert_eq!(active[1].duration_minutes(), 480);
}

#[test]
fn duplicate_code_is_rejected() {
    let catalog = TemplateCatalog::new();
    catalog.create(morning()).unwrap();
    let err = catalog.create(morning()).unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));
}

#[test]
fn invalid_code_is_rejected() {
    let catalog = TemplateCatalog::new();
    let mut bad = morning();
    bad.code = "m1".to_string();
    assert!(matches!(
        catalog.create(bad),
        Err(PlanError::Validation(_))
    ));
    let mut too_long = morning();
    too_long.code = "ABCDEFGHIJK".to_string();
    assert!(matches!(
        catalog.create(too_long),
        Err(PlanError::Validation(_))
    ));
}

#[test]
fn referenced_template_is_frozen_but_deactivatable() {
    let catalog = TemplateCatalog::new();
    catalog.create(morning()).unwrap();
    catalog.mark_referenced("MAT");

    let err = catalog
        .update(
            "MAT",
            TemplateUpdate {
                name: Some("Matin 2".to_string()),
                ..TemplateUpdate::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, PlanError::InvalidTransition(_)));

    catalog.deactivate("MAT").unwrap();
    assert!(catalog.list_active().is_empty());
    // toujours lisible pour l'historique
    assert!(catalog.get("MAT").is_some());
}

#[test]
fn update_of_unreferenced_template_revalidates() {
    let catalog = TemplateCatalog::new();
    catalog.create(morning()).unwrap();
    let updated = catalog
        .update(
            "MAT",
            TemplateUpdate {
                end: Some(t(15, 0)),
                ..TemplateUpdate::default()
            },
        )
        .unwrap();
    assert_eq!(updated.duration_minutes(), 540);

    // fenêtre vide refusée
    let err = catalog
        .update(
            "MAT",
            TemplateUpdate {
                end: Some(t(6, 0)),
                start: Some(t(6, 0)),
                ..TemplateUpdate::default()
            },
        )
        .unwrap_err();
    assert!(matches!(err, PlanError::Validation(_)));
}

#[test]
fn overlapping_windows_are_reported() {
    let catalog = TemplateCatalog::new();
    catalog.create(morning()).unwrap();
    let hits = catalog.find_overlapping(t(12, 0), t(20, 0));
    assert_eq!(hits.len(), 1);
    let none = catalog.find_overlapping(t(14, 0), t(20, 0));
    assert!(none.is_empty());
}
