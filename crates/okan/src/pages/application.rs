//! Two-step enrollment application form (`/inscricao`).
//!
//! Step 1 collects personal data, step 2 the track choice and background; step 3 is the
//! confirmation. Applications are logged, not stored.

use serde::{Deserialize, Serialize};
use tracing::info;

pub const TRACK_OPTIONS: [(&str, &str); 5] = [
    ("frontend", "Front-end"),
    ("backend", "Back-end"),
    ("mobile", "Mobile"),
    ("dados", "Dados"),
    ("ux-design", "UX & Design"),
];

pub const EXPERIENCE_OPTIONS: [(&str, &str); 4] = [
    ("none", "Nenhuma experiência"),
    ("beginner", "Já estudei um pouco por conta própria"),
    ("intermediate", "Fiz alguns cursos online"),
    ("advanced", "Tenho experiência prática"),
];

const CONFIRMATION_STEP: u8 = 3;

fn default_step() -> u8 {
    1
}

/// Form as posted; every field is optional so partial submissions can be re-rendered.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ApplicationForm {
    #[serde(default = "default_step")]
    pub step: u8,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub track: String,
    #[serde(default)]
    pub experience: String,
    #[serde(default)]
    pub motivation: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct SelectOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApplicationPage {
    pub step: u8,
    pub form: ApplicationForm,
    pub errors: Vec<FieldError>,
    pub track_options: Vec<SelectOption>,
    pub experience_options: Vec<SelectOption>,
    /// Set once the application went through.
    pub confirmation: Option<&'static str>,
}

fn options(pairs: &[(&'static str, &'static str)]) -> Vec<SelectOption> {
    pairs
        .iter()
        .map(|&(value, label)| SelectOption { value, label })
        .collect()
}

fn page(step: u8, form: ApplicationForm, errors: Vec<FieldError>) -> ApplicationPage {
    ApplicationPage {
        confirmation: (step == CONFIRMATION_STEP).then_some("Inscrição enviada!"),
        step,
        form,
        errors,
        track_options: options(&TRACK_OPTIONS),
        experience_options: options(&EXPERIENCE_OPTIONS),
    }
}

/// The blank form at step 1.
pub fn application_page() -> ApplicationPage {
    page(1, ApplicationForm::default(), Vec::new())
}

fn personal_errors(form: &ApplicationForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if form.name.trim().is_empty() {
        errors.push(FieldError {
            field: "name",
            message: "Informe seu nome",
        });
    }
    let email = form.email.trim();
    if email.is_empty() || !email.contains('@') {
        errors.push(FieldError {
            field: "email",
            message: "Informe um e-mail válido",
        });
    }
    if form.phone.trim().is_empty() {
        errors.push(FieldError {
            field: "phone",
            message: "Informe seu telefone",
        });
    }
    errors
}

fn choice_errors(form: &ApplicationForm) -> Vec<FieldError> {
    let mut errors = Vec::new();
    if !TRACK_OPTIONS.iter().any(|(v, _)| *v == form.track) {
        errors.push(FieldError {
            field: "track",
            message: "Selecione uma trilha",
        });
    }
    if !EXPERIENCE_OPTIONS.iter().any(|(v, _)| *v == form.experience) {
        errors.push(FieldError {
            field: "experience",
            message: "Selecione uma opção",
        });
    }
    if form.motivation.trim().is_empty() {
        errors.push(FieldError {
            field: "motivation",
            message: "Conte por que você quer participar",
        });
    }
    errors
}

/// Validates the posted step and moves forward when it is complete.
pub fn submit(form: ApplicationForm) -> ApplicationPage {
    let personal = personal_errors(&form);
    if form.step <= 1 || !personal.is_empty() {
        let next = if personal.is_empty() { 2 } else { 1 };
        return page(next, form, personal);
    }

    let choices = choice_errors(&form);
    if !choices.is_empty() {
        return page(2, form, choices);
    }

    info!(
        name = %form.name.trim(),
        email = %form.email.trim(),
        track = %form.track,
        experience = %form.experience,
        "Application submitted"
    );
    page(CONFIRMATION_STEP, form, Vec::new())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn personal() -> ApplicationForm {
        ApplicationForm {
            step: 1,
            name: "Ana Souza".into(),
            email: "ana@okan.dev".into(),
            phone: "11 99999-0000".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_step_one_requires_personal_data() {
        let view = submit(ApplicationForm {
            email: "sem-arroba".into(),
            ..personal()
        });
        assert_eq!(view.step, 1);
        assert_eq!(view.errors.len(), 1);
        assert_eq!(view.errors[0].field, "email");

        let view = submit(personal());
        assert_eq!(view.step, 2);
        assert!(view.errors.is_empty());
        assert!(view.confirmation.is_none());
    }

    #[test]
    fn test_step_two_completes() {
        let incomplete = submit(ApplicationForm {
            step: 2,
            track: "frontend".into(),
            ..personal()
        });
        assert_eq!(incomplete.step, 2);
        let fields: Vec<_> = incomplete.errors.iter().map(|e| e.field).collect();
        assert_eq!(fields, vec!["experience", "motivation"]);

        let done = submit(ApplicationForm {
            step: 2,
            track: "dados".into(),
            experience: "beginner".into(),
            motivation: "Quero mudar de carreira".into(),
            ..personal()
        });
        assert_eq!(done.step, 3);
        assert_eq!(done.confirmation, Some("Inscrição enviada!"));
    }

    #[test]
    fn test_blank_form() {
        let view = application_page();
        assert_eq!(view.step, 1);
        assert_eq!(view.track_options.len(), 5);
        assert_eq!(view.experience_options[0].label, "Nenhuma experiência");
    }
}
