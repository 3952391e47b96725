//! Process exit codes; every failure point of every command has its own negative code.

// self
use crate::_prelude::*;

macro_rules! exit_statuses {
	($($(#[$doc:meta])* $variant:ident = $code:literal => $name:literal,)+) => {
		/// Exit status of one `sdcm` run.
		#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
		pub enum ExitStatus {
			$($(#[$doc])* $variant,)+
		}
		impl ExitStatus {
			/// Every status, in code order.
			pub const ALL: &'static [Self] = &[$(Self::$variant,)+];

			/// Numeric process exit code.
			pub const fn code(self) -> i32 {
				match self {
					$(Self::$variant => $code,)+
				}
			}

			/// Symbolic name printed next to the code.
			pub const fn name(self) -> &'static str {
				match self {
					$(Self::$variant => $name,)+
				}
			}
		}
	};
}

exit_statuses! {
	/// Command completed.
	Success = 0 => "SUCCESS",
	/// No command ran to a conclusion.
	Unspecified = -1 => "UNSPECIFIED",
	/// Unexpected local failure.
	UnhandledException = -2 => "UNHANDLED_EXCEPTION",
	/// Arguments could not be parsed.
	CommandLineOptionParsingFailed = -3 => "COMMAND_LINE_OPTION_PARSING_FAILED",
	/// No credentials were found.
	NoDevCenterCredentialsFound = -4 => "NO_DEV_CENTER_CREDENTIALS_FOUND",
	/// `--server` is out of range.
	OverrideServerInvalid = -5 => "OVERRIDE_SERVER_INVALID",
	/// `--create` file is missing.
	CreateInputFileDoesNotExist = -6 => "CREATE_INPUT_FILE_DOES_NOT_EXIST",
	/// Create product was rejected.
	NewProductApiFailed = -7 => "NEW_PRODUCT_API_FAILED",
	/// Create submission without `--productid`.
	NewSubmissionProductIdMissing = -8 => "NEW_SUBMISSION_PRODUCT_ID_MISSING",
	/// Create submission was rejected.
	NewSubmissionApiFailed = -9 => "NEW_SUBMISSION_API_FAILED",
	/// Create shipping label without `--productid`.
	NewShippingLabelProductIdMissing = -10 => "NEW_SHIPPING_LABEL_PRODUCT_ID_MISSING",
	/// Create shipping label without `--submissionid`.
	NewShippingLabelSubmissionIdMissing = -11 => "NEW_SHIPPING_LABEL_SUBMISSION_ID_MISSING",
	/// Create shipping label was rejected.
	NewShippingLabelCreateApiFailed = -12 => "NEW_SHIPPING_LABEL_CREATE_API_FAILED",
	/// Submission lookup before label creation failed.
	NewShippingLabelGetSubmissionApiFailed = -13 => "NEW_SHIPPING_LABEL_GET_SUBMISSION_API_FAILED",
	/// Commit without `--productid`.
	CommitProductIdMissing = -14 => "COMMIT_PRODUCT_ID_MISSING",
	/// Commit without `--submissionid`.
	CommitSubmissionIdMissing = -15 => "COMMIT_SUBMISSION_ID_MISSING",
	/// Commit was rejected.
	CommitApiFailed = -16 => "COMMIT_API_FAILED",
	/// Product listing failed.
	ListGetProductsApiFailed = -17 => "LIST_GET_PRODUCTS_API_FAILED",
	/// Submission listing failed.
	ListGetSubmissionApiFailed = -18 => "LIST_GET_SUBMISSION_API_FAILED",
	/// Shipping label listing failed.
	ListGetShippingLabelApiFailed = -19 => "LIST_GET_SHIPPING_LABEL_API_FAILED",
	/// Download directory does not exist.
	DownloadOutputPathNotExist = -20 => "DOWNLOAD_OUTPUT_PATH_NOT_EXIST",
	/// Download target exists already.
	DownloadOutputFileAlreadyExists = -21 => "DOWNLOAD_OUTPUT_FILE_ALREADY_EXISTS",
	/// Download without `--productid`.
	DownloadProductIdMissing = -22 => "DOWNLOAD_PRODUCT_ID_MISSING",
	/// Download without `--submissionid`.
	DownloadSubmissionIdMissing = -23 => "DOWNLOAD_SUBMISSION_ID_MISSING",
	/// Submission lookup before download failed.
	DownloadGetSubmissionApiFailed = -24 => "DOWNLOAD_GET_SUBMISSION_API_FAILED",
	/// Metadata download without `--submissionid`.
	MetadataSubmissionIdMissing = -25 => "METADATA_SUBMISSION_ID_MISSING",
	/// Metadata download without `--productid`.
	MetadataProductIdMissing = -26 => "METADATA_PRODUCT_ID_MISSING",
	/// Submission lookup before metadata download failed.
	MetadataGetSubmissionApiFailed = -27 => "METADATA_GET_SUBMISSION_API_FAILED",
	/// Upload without `--productid`.
	UploadProductIdMissing = -28 => "UPLOAD_PRODUCT_ID_MISSING",
	/// Submission lookup before upload failed.
	UploadGetSubmissionApiFailed = -29 => "UPLOAD_GET_SUBMISSION_API_FAILED",
	/// Upload without `--submissionid`.
	UploadSubmissionIdMissing = -30 => "UPLOAD_SUBMISSION_ID_MISSING",
	/// Wait without `--productid`.
	WaitProductIdMissing = -31 => "WAIT_PRODUCT_ID_MISSING",
	/// Wait without `--submissionid`.
	WaitSubmissionIdMissing = -32 => "WAIT_SUBMISSION_ID_MISSING",
	/// Submission lookup while waiting failed.
	WaitGetSubmissionApiFailed = -33 => "WAIT_GET_SUBMISSION_API_FAILED",
	/// Submission failed service-side.
	WaitSubmissionFailedInHwdc = -34 => "WAIT_SUBMISSION_FAILED_IN_HWDC",
	/// Shipping label lookup while waiting failed.
	WaitGetShippingLabelApiFailed = -35 => "WAIT_GET_SHIPPING_LABEL_API_FAILED",
	/// Shipping label failed service-side.
	WaitShippingLabelFailedInHwdc = -36 => "WAIT_SHIPPING_LABEL_FAILED_IN_HWDC",
	/// Audience listing failed.
	AudienceGetAudienceApiFailed = -37 => "AUIDENCE_GET_AUDIENCE_API_FAILED",
	/// Partner submission listing failed.
	ListGetPartnerSubmissionApiFailed = -38 => "LIST_GET_PARTNER_SUBMISSION_API_FAILED",
	/// `--list` names an unknown resource.
	ListInvalidOption = -39 => "LIST_INVALID_OPTION",
	/// Create metadata without `--productid`.
	CreateMetadataProductIdMissing = -40 => "CREATEMETADATA_PRODUCT_ID_MISSING",
	/// Create metadata without `--submissionid`.
	CreateMetadataSubmissionIdMissing = -41 => "CREATEMETADATA_SUBMISSION_ID_MISSING",
	/// Create metadata was rejected.
	CreateMetadataApiFailed = -42 => "CREATEMETADATA_API_FAILED",
	/// Translate without `--productid`.
	TranslateProductIdMissing = -43 => "TRANSLATE_PRODUCT_ID_MISSING",
	/// Translate without `--submissionid`.
	TranslateSubmissionIdMissing = -44 => "TRANSLATE_SUBMISSION_ID_MISSING",
	/// Translate without `--publisherid`.
	TranslatePublisherIdMissing = -45 => "TRANSLATE_PUBLISHER_ID_MISSING",
	/// Translate was rejected or found nothing.
	TranslateApiFailed = -46 => "TRANSLATE_API_FAILED",
	/// Submission does not exist for this account.
	SubmissionEntityNotFound = -47 => "SUBMISSION_ENTITY_NOT_FOUND",
	/// Commit of a submission that is no longer pending.
	CommitRequestInvalidForCurrentState = -48 => "COMMIT_REQUEST_INVALID_FOR_CURRENT_STATE",
	/// Service throttled the call.
	Http429RateLimitExceeded = -429 => "HTTP_429_RATE_LIMIT_EXCEEDED",
	/// Call failed without a service verdict (transport, auth, decoding, transfer).
	PartnerCenterHttpException = -1000 => "PARTNER_CENTER_HTTP_EXCEPTION",
}

impl ExitStatus {
	/// `true` for [`ExitStatus::Success`].
	pub fn is_success(self) -> bool {
		self == Self::Success
	}
}
impl Display for ExitStatus {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "{} ({})", self.code(), self.name())
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::collections::HashSet;
	// self
	use super::*;

	#[test]
	fn codes_and_names_are_unique() {
		let codes = ExitStatus::ALL.iter().map(|status| status.code()).collect::<HashSet<_>>();
		let names = ExitStatus::ALL.iter().map(|status| status.name()).collect::<HashSet<_>>();

		assert_eq!(codes.len(), ExitStatus::ALL.len());
		assert_eq!(names.len(), ExitStatus::ALL.len());
		assert_eq!(ExitStatus::ALL.len(), 51);
	}

	#[test]
	fn display_pairs_code_and_name() {
		assert_eq!(ExitStatus::Http429RateLimitExceeded.to_string(), "-429 (HTTP_429_RATE_LIMIT_EXCEEDED)");
		assert_eq!(ExitStatus::CommitRequestInvalidForCurrentState.code(), -48);
		assert!(ExitStatus::Success.is_success());
	}
}
