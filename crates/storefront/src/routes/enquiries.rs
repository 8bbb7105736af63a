//! Customer enquiry form.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    extract::{Multipart, State},
    response::{IntoResponse, Redirect, Response},
};
use tracing::instrument;

use wendy_woo_core::Email;

use crate::error::AppError;
use crate::filters;
use crate::middleware::PageContext;
use crate::models::{Enquiry, InquiryType, enquiry::MAX_ENQUIRY_NAME_LENGTH};
use crate::routes::form::SubmittedForm;
use crate::state::AppState;

/// Values echoed back into the form after a failed submission.
#[derive(Debug, Clone, Default)]
pub struct EnquiryValues {
    pub inquiry_type: String,
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Enquiry page template.
#[derive(Template, WebTemplate)]
#[template(path = "enquiries.html")]
pub struct EnquiryTemplate {
    pub ctx: PageContext,
    pub inquiry_types: [InquiryType; 3],
    pub values: EnquiryValues,
    /// Summary shown above the form.
    pub error: Option<String>,
    /// One entry per invalid field.
    pub field_errors: Vec<String>,
}

impl EnquiryTemplate {
    fn new(ctx: PageContext, values: EnquiryValues) -> Self {
        Self {
            ctx,
            inquiry_types: InquiryType::ALL,
            values,
            error: None,
            field_errors: Vec::new(),
        }
    }
}

/// Enquiry sent page template.
#[derive(Template, WebTemplate)]
#[template(path = "enquiry_success.html")]
pub struct EnquirySuccessTemplate {
    pub ctx: PageContext,
}

/// `GET /enquiries`
pub async fn page(ctx: PageContext) -> EnquiryTemplate {
    EnquiryTemplate::new(ctx, EnquiryValues::default())
}

/// `POST /enquiries` (multipart: `inquiry_type`, `name`, `email`, `message`, `photo`).
#[instrument(skip(state, ctx, multipart))]
pub async fn submit(
    State(state): State<AppState>,
    ctx: PageContext,
    multipart: Multipart,
) -> Result<Response, AppError> {
    let mut form = SubmittedForm::read(multipart).await?;
    let values = EnquiryValues {
        inquiry_type: form.text("inquiry_type").to_string(),
        name: form.text("name").to_string(),
        email: form.text("email").to_string(),
        message: form.text("message").to_string(),
    };

    let enquiry = match validate(&values, &mut form) {
        Ok(enquiry) => enquiry,
        Err(field_errors) => {
            let mut page = EnquiryTemplate::new(ctx, values);
            page.error = Some("Please correct the errors below.".to_string());
            page.field_errors = field_errors;
            return Ok(page.into_response());
        }
    };

    if let Err(e) = state.email().send_enquiry(&enquiry).await {
        tracing::error!(error = %e, inquiry_type = %enquiry.inquiry_type, "Failed to send enquiry");
        let mut page = EnquiryTemplate::new(ctx, values);
        page.error =
            Some("There was an error sending your enquiry. Please try again.".to_string());
        return Ok(page.into_response());
    }

    tracing::info!(
        inquiry_type = %enquiry.inquiry_type,
        has_photo = enquiry.photo.is_some(),
        "Enquiry sent"
    );
    Ok(Redirect::to("/enquiry-success").into_response())
}

/// `GET /enquiry-success`
pub async fn success(ctx: PageContext) -> EnquirySuccessTemplate {
    EnquirySuccessTemplate { ctx }
}

/// Check every field, collecting all problems rather than stopping at the first.
fn validate(values: &EnquiryValues, form: &mut SubmittedForm) -> Result<Enquiry, Vec<String>> {
    let mut errors = Vec::new();

    let inquiry_type = values.inquiry_type.parse::<InquiryType>().ok();
    if inquiry_type.is_none() {
        errors.push("Please select an inquiry type.".to_string());
    }

    if values.name.is_empty() {
        errors.push("Please enter your name.".to_string());
    } else if values.name.chars().count() > MAX_ENQUIRY_NAME_LENGTH {
        errors.push(format!(
            "Name must be at most {MAX_ENQUIRY_NAME_LENGTH} characters."
        ));
    }

    let email = Email::parse(&values.email).ok();
    if email.is_none() {
        errors.push("Please enter a valid email address.".to_string());
    }

    if values.message.is_empty() {
        errors.push("Please enter a message.".to_string());
    }

    let photo = form.take_photo().unwrap_or_else(|err| {
        errors.push(err.public_message());
        None
    });

    match (inquiry_type, email) {
        (Some(inquiry_type), Some(email)) if errors.is_empty() => Ok(Enquiry {
            inquiry_type,
            name: values.name.clone(),
            email,
            message: values.message.clone(),
            photo,
        }),
        _ => Err(errors),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(inquiry_type: &str, name: &str, email: &str, message: &str) -> EnquiryValues {
        EnquiryValues {
            inquiry_type: inquiry_type.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            message: message.to_string(),
        }
    }

    #[test]
    fn test_validate_accepts_complete_form() {
        let mut form = SubmittedForm::default();
        let enquiry = validate(
            &values("orders", "Hana", "hana@example.com", "Do you deliver?"),
            &mut form,
        )
        .expect("valid enquiry");

        assert_eq!(enquiry.inquiry_type, InquiryType::Orders);
        assert_eq!(enquiry.email.as_str(), "hana@example.com");
        assert!(enquiry.photo.is_none());
    }

    #[test]
    fn test_validate_reports_every_bad_field() {
        let mut form = SubmittedForm::default();
        let errors = validate(&values("refunds", "", "not-an-email", ""), &mut form)
            .expect_err("invalid enquiry");

        assert_eq!(errors.len(), 4);
    }

    #[test]
    fn test_validate_rejects_long_name() {
        let mut form = SubmittedForm::default();
        let name = "a".repeat(MAX_ENQUIRY_NAME_LENGTH + 1);
        let errors = validate(&values("others", &name, "hana@example.com", "Hi"), &mut form)
            .expect_err("name too long");

        assert_eq!(errors, vec!["Name must be at most 100 characters.".to_string()]);
    }
}
