//! VietQR quick-link images for bank transfer checkout.
//!
//! The image URL has the shape
//! `https://img.vietqr.io/image/{bank}-{account}-{template}.png?amount=..&addInfo=..&accountName=..`.
//! Bank details come from the `payment` settings record.

use serde_json::Value;
use url::Url;

pub const VIETQR_IMAGE_BASE: &str = "https://img.vietqr.io/image";
pub const DEFAULT_TEMPLATE: &str = "qr_only";

/// Inputs for one QR image. Blank optional fields are left out of the URL.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct QrImageRequest<'a> {
    pub bank_code: Option<&'a str>,
    pub account_number: Option<&'a str>,
    pub template: Option<&'a str>,
    pub amount: Option<f64>,
    pub add_info: Option<&'a str>,
    pub account_name: Option<&'a str>,
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|trimmed| !trimmed.is_empty())
}

/// Build the image URL, or `None` when the bank code or account number is blank.
#[must_use]
pub fn image_url(request: &QrImageRequest<'_>) -> Option<String> {
    let bank = non_blank(request.bank_code)?;
    let account = non_blank(request.account_number)?;
    let template = non_blank(request.template).unwrap_or(DEFAULT_TEMPLATE);

    let mut url = Url::parse(VIETQR_IMAGE_BASE).ok()?;
    url.path_segments_mut()
        .ok()?
        .push(&format!("{bank}-{account}-{template}.png"));

    let mut query = Vec::new();
    if let Some(amount) = request.amount.filter(|amount| amount.is_finite() && *amount > 0.0) {
        query.push(("amount", format!("{:.0}", amount.round())));
    }
    if let Some(add_info) = non_blank(request.add_info) {
        query.push(("addInfo", add_info.to_string()));
    }
    if let Some(account_name) = non_blank(request.account_name) {
        query.push(("accountName", account_name.to_string()));
    }
    if !query.is_empty() {
        url.query_pairs_mut().extend_pairs(query);
    }

    Some(url.into())
}

/// Bank transfer details as stored in the `payment` (or legacy `site`) settings value.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BankConfig {
    pub bank_account_number: Option<String>,
    pub bank_account_name: Option<String>,
    pub bank_code: Option<String>,
}

impl BankConfig {
    /// Read bank fields from a settings value. Non-string fields count as missing.
    #[must_use]
    pub fn from_settings(value: &Value) -> Self {
        let field = |name: &str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(|text| text.trim().to_string())
        };
        Self {
            bank_account_number: field("bankAccountNumber"),
            bank_account_name: field("bankAccountName"),
            bank_code: field("bankCode"),
        }
    }

    /// Account number, account name and bank code are all present and non-blank.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        [
            &self.bank_account_number,
            &self.bank_account_name,
            &self.bank_code,
        ]
        .iter()
        .all(|field| non_blank(field.as_deref()).is_some())
    }

    /// QR request for this account; `amount` and `add_info` are per checkout.
    #[must_use]
    pub fn qr_request<'a>(
        &'a self,
        amount: Option<f64>,
        add_info: Option<&'a str>,
        template: Option<&'a str>,
    ) -> QrImageRequest<'a> {
        QrImageRequest {
            bank_code: self.bank_code.as_deref(),
            account_number: self.bank_account_number.as_deref(),
            template,
            amount,
            add_info,
            account_name: self.bank_account_name.as_deref(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request<'a>(bank: &'a str, account: &'a str) -> QrImageRequest<'a> {
        QrImageRequest {
            bank_code: Some(bank),
            account_number: Some(account),
            ..QrImageRequest::default()
        }
    }

    #[test]
    fn minimal_url_uses_default_template() {
        assert_eq!(
            image_url(&request(" vcb ", "0123456789")).as_deref(),
            Some("https://img.vietqr.io/image/vcb-0123456789-qr_only.png")
        );
    }

    #[test]
    fn blank_bank_or_account_yields_none() {
        assert_eq!(image_url(&request("", "0123")), None);
        assert_eq!(image_url(&request("vcb", "   ")), None);
        assert_eq!(image_url(&QrImageRequest::default()), None);
    }

    #[test]
    fn optional_parameters_are_encoded() {
        let url = image_url(&QrImageRequest {
            bank_code: Some("970436"),
            account_number: Some("0123456789"),
            template: Some("compact"),
            amount: Some(499_000.4),
            add_info: Some(" DOHY thanh toan "),
            account_name: Some("NGUYEN VAN A"),
        });
        assert_eq!(
            url.as_deref(),
            Some(
                "https://img.vietqr.io/image/970436-0123456789-compact.png?amount=499000&addInfo=DOHY+thanh+toan&accountName=NGUYEN+VAN+A"
            )
        );
    }

    #[test]
    fn non_positive_amount_and_blank_template_are_dropped() {
        let url = image_url(&QrImageRequest {
            template: Some("  "),
            amount: Some(0.0),
            ..request("vcb", "01")
        });
        assert_eq!(
            url.as_deref(),
            Some("https://img.vietqr.io/image/vcb-01-qr_only.png")
        );
        let url = image_url(&QrImageRequest {
            amount: Some(f64::NAN),
            ..request("vcb", "01")
        });
        assert_eq!(
            url.as_deref(),
            Some("https://img.vietqr.io/image/vcb-01-qr_only.png")
        );
    }

    #[test]
    fn path_characters_are_percent_encoded() {
        let url = image_url(&request("a/b", "1 2?#")).unwrap_or_default();
        assert!(url.starts_with("https://img.vietqr.io/image/a%2Fb-1%202%3F%23-qr_only.png"));
        assert!(!url.contains('?'));
    }

    #[test]
    fn bank_config_reads_settings_value() {
        let config = BankConfig::from_settings(&json!({
            "bankAccountNumber": " 0123456789 ",
            "bankAccountName": "NGUYEN VAN A",
            "bankCode": "vcb",
            "hotline": "0900 000 000",
        }));
        assert!(config.is_complete());
        assert_eq!(config.bank_account_number.as_deref(), Some("0123456789"));

        let url = image_url(&config.qr_request(Some(100_000.0), Some("DH01"), None));
        assert_eq!(
            url.as_deref(),
            Some(
                "https://img.vietqr.io/image/vcb-0123456789-qr_only.png?amount=100000&addInfo=DH01&accountName=NGUYEN+VAN+A"
            )
        );
    }

    #[test]
    fn incomplete_bank_config() {
        assert!(!BankConfig::default().is_complete());
        assert!(!BankConfig::from_settings(&json!(null)).is_complete());
        let config = BankConfig::from_settings(&json!({
            "bankAccountNumber": 123,
            "bankAccountName": "A",
            "bankCode": "vcb",
        }));
        assert!(!config.is_complete());
        let config = BankConfig::from_settings(&json!({
            "bankAccountNumber": "01",
            "bankAccountName": " ",
            "bankCode": "vcb",
        }));
        assert!(!config.is_complete());
    }
}
