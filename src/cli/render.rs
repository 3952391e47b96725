//! Plain-text dumps of API entities and rejections for the console.

// std
use std::fmt::Write;
// self
use crate::{
	_prelude::*,
	api::{Audience, Downloads, Link, Product, ShippingLabel, Submission, WorkflowStatus},
	decode::ErrorDetails,
};

const INDENT: &str = "               ";

/// Product summary.
pub fn product(product: &Product) -> String {
	let mut out = String::new();

	line(&mut out, "Product", "");
	line(&mut out, "         id:", opt(&product.id));
	line(&mut out, "         name:", opt(&product.product_name));
	line(&mut out, "         shared id:", opt(&product.shared_product_id));
	line(&mut out, "         type:", opt(&product.product_type));
	line(&mut out, "         device type:", opt(&product.device_type));
	line(&mut out, "         firmware:", opt(&product.firmware_version));
	line(&mut out, "         signatures:", &product.requested_signatures.join(", "));
	line(&mut out, "         test sign:", &product.is_test_sign.to_string());
	line(&mut out, "         flight sign:", &product.is_flight_sign.to_string());
	line(&mut out, "         created by:", opt(&product.created_by));
	line(&mut out, "         created:", opt(&product.created_date_time));
	line(&mut out, "         updated:", opt(&product.updated_date_time));

	out
}

/// Submission summary with links, status and downloads.
pub fn submission(submission: &Submission) -> String {
	let mut out = String::new();

	line(&mut out, "Submission", "");
	line(&mut out, "         id:", opt(&submission.id));
	line(&mut out, "         productId:", opt(&submission.product_id));
	line(&mut out, "         name:", opt(&submission.name));
	line(&mut out, "         type:", opt(&submission.kind));
	line(&mut out, "         commitStatus:", opt(&submission.commit_status));
	line(&mut out, "         created by:", opt(&submission.created_by));
	line(&mut out, "         created:", opt(&submission.created_date_time));
	out.push_str(&links(&submission.links));

	if let Some(status) = &submission.workflow_status {
		out.push_str(&workflow_status(status));
	}
	if let Some(downloads) = &submission.downloads {
		out.push_str(&self::downloads(downloads));
	}

	out
}

/// Shipping label summary with targeting.
pub fn shipping_label(label: &ShippingLabel) -> String {
	let mut out = String::new();

	line(&mut out, "Shipping Label", "");
	line(&mut out, "         id:", opt(&label.id));
	line(&mut out, "         productId:", opt(&label.product_id));
	line(&mut out, "         submissionId:", opt(&label.submission_id));
	line(&mut out, "         name:", opt(&label.name));
	line(&mut out, "         destination:", opt(&label.destination));

	if let Some(spec) = &label.publishing_specifications {
		line(&mut out, "         goLiveDate:", opt(&spec.go_live_date));
	}
	if let Some(targeting) = &label.targeting {
		line(&mut out, "         hardwareIds:", "");

		for id in &targeting.hardware_ids {
			let _ = writeln!(
				out,
				"{INDENT}- {} {} {} {}",
				id.bundle_id, id.inf_id, id.operating_system_code, id.pnp_string
			);
		}
		for chid in &targeting.chids {
			let _ = writeln!(out, "{INDENT}- chid: {}", chid.chid);
		}
		if !targeting.restricted_to_audiences.is_empty() {
			line(
				&mut out,
				"         audiences:",
				&targeting.restricted_to_audiences.join(", "),
			);
		}
	}

	out.push_str(&links(&label.links));

	if let Some(status) = &label.workflow_status {
		out.push_str(&workflow_status(status));
	}

	out
}

/// Audience summary.
pub fn audience(audience: &Audience) -> String {
	let mut out = String::new();

	line(&mut out, "Audience", "");
	line(&mut out, "         id:", opt(&audience.id));
	line(&mut out, "         name:", opt(&audience.name));
	line(&mut out, "         audienceName:", opt(&audience.audience_name));
	line(&mut out, "         description:", opt(&audience.description));

	out
}

/// Link list.
pub fn links(links: &[Link]) -> String {
	let mut out = String::new();

	if links.is_empty() {
		return out;
	}

	line(&mut out, "         Links:", "");

	for link in links {
		let _ = writeln!(out, "{INDENT}- href:   {}", link.href);
		let _ = writeln!(out, "{INDENT}- method: {}", link.method);
		let _ = writeln!(out, "{INDENT}- rel:    {}", link.rel);
	}

	out
}

/// Download items and messages.
pub fn downloads(downloads: &Downloads) -> String {
	let mut out = String::new();

	line(&mut out, "         Downloads:", "");

	for item in &downloads.items {
		let _ = writeln!(out, "{INDENT}- url: {}", item.url);
		let _ = writeln!(out, "{INDENT}- type:{}", item.kind);
	}

	let _ = writeln!(out, "{INDENT}- messages: ");

	for message in &downloads.messages {
		let _ = writeln!(out, "{INDENT}  {message}");
	}

	out
}

/// Workflow step, state, messages and error report URL.
pub fn workflow_status(status: &WorkflowStatus) -> String {
	let mut out = String::new();

	line(&mut out, "         WorkflowStatus:", "");
	let _ = writeln!(out, "{INDENT}- currentStep: {}", status.step());
	let _ = writeln!(out, "{INDENT}- state:       {}", status.state());

	if !status.messages.is_empty() {
		let _ = writeln!(out, "{INDENT}- messages:");

		for message in &status.messages {
			let _ = writeln!(out, "{INDENT}  {message}");
		}
	}
	if let Some(url) = status.error_report_url() {
		let _ = writeln!(out, "{INDENT}- errorReport: {url}");
	}

	out
}

/// Rejection dump, ending with the run's correlation id.
pub fn error_details(details: &ErrorDetails, correlation_id: &str) -> String {
	let mut out = String::from("ERROR (DevCenterErrorDetails)\n");
	let _ = writeln!(out, "Code:    {}", details.code);
	let _ = writeln!(out, "HttpCode:{}", details.http_status);
	let _ = writeln!(out, "Message: {}", details.message);

	if !details.validation_errors.is_empty() {
		out.push_str("ValidationErrors:\n");

		for entry in &details.validation_errors {
			let _ = writeln!(out, "  Target: {}", entry.target.as_deref().unwrap_or_default());
			let _ = writeln!(out, "  Message:{}", entry.message.as_deref().unwrap_or_default());
		}
	}

	let _ = writeln!(out, "Correlation Id: {correlation_id}");

	if let Some(trace) = &details.trace {
		let _ = writeln!(out, "Trace:          {trace}");
	}

	out
}

fn line(out: &mut String, label: &str, value: &str) {
	if value.is_empty() {
		let _ = writeln!(out, "{label}");
	} else {
		let _ = writeln!(out, "{label} {value}");
	}
}

fn opt(value: &Option<String>) -> &str {
	value.as_deref().unwrap_or_default()
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::decode::ValidationError;

	#[test]
	fn error_dump_lists_validation_errors_and_correlation() {
		let details = ErrorDetails {
			code: "invalidInput".into(),
			message: "Bad request".into(),
			http_status: 400,
			validation_errors: vec![ValidationError {
				target: Some("productName".into()),
				message: Some("Required".into()),
			}],
			trace: None,
		};
		let dump = error_details(&details, "c0ffee");

		assert!(dump.starts_with("ERROR (DevCenterErrorDetails)\nCode:    invalidInput\nHttpCode:400\n"));
		assert!(dump.contains("  Target: productName\n  Message:Required\n"));
		assert!(dump.ends_with("Correlation Id: c0ffee\n"));
	}

	#[test]
	fn submission_dump_includes_links_and_downloads() {
		let submission: Submission = serde_json::from_str(
			r#"{
				"id": "9",
				"name": "Driver",
				"links": [{"href": "https://devcenter.invalid/s/9", "rel": "self", "method": "GET"}],
				"workflowStatus": {"currentStep": "finalizeIngestion", "state": "completed"},
				"downloads": {"items": [{"type": "signedPackage", "url": "https://blob.invalid/s"}], "messages": []}
			}"#,
		)
		.expect("Submission should decode.");
		let dump = self::submission(&submission);

		assert!(dump.contains("         id: 9\n"));
		assert!(dump.contains(&format!("{INDENT}- href:   https://devcenter.invalid/s/9\n")));
		assert!(dump.contains(&format!("{INDENT}- rel:    self\n")));
		assert!(dump.contains(&format!("{INDENT}- currentStep: finalizeIngestion\n")));
		assert!(dump.contains(&format!("{INDENT}- type:signedPackage\n")));
	}

	#[test]
	fn empty_fields_render_bare_labels() {
		let dump = audience(&Audience::default());

		assert_eq!(dump.lines().nth(1), Some("         id:"));
	}
}
