use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentConfig {
    /// Report price in KES.
    pub amount:        f64,
    pub till_number:   String,
    pub business_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PurposeConfig {
    pub id:    String,
    pub title: String,
    pub icon:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimingConfig {
    pub generation_interval_ms:         u64,
    pub generation_increment:           f64,
    pub generation_completion_delay_ms: u64,
    pub signup_interval_ms:             u64,
    pub signup_increment:               f64,
    pub signup_deadline_ms:             u64,
    pub payment_redirect_delay_ms:      u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            generation_interval_ms:         150,
            generation_increment:           1.0,
            generation_completion_delay_ms: 500,
            signup_interval_ms:             100,
            signup_increment:               2.5,
            signup_deadline_ms:             4_000,
            payment_redirect_delay_ms:      1_500,
        }
    }
}

impl TimingConfig {
    /// Schedules step by a positive interval and a positive increment;
    /// anything else never reaches 100.
    pub fn validate(&self) -> anyhow::Result<()> {
        let intervals = [
            ("generation_interval_ms", self.generation_interval_ms),
            ("signup_interval_ms", self.signup_interval_ms),
        ];
        for (name, ms) in intervals {
            if ms == 0 {
                anyhow::bail!("timing.{name} must be greater than 0");
            }
        }
        let increments = [
            ("generation_increment", self.generation_increment),
            ("signup_increment", self.signup_increment),
        ];
        for (name, step) in increments {
            if !(step.is_finite() && step > 0.0) {
                anyhow::bail!("timing.{name} must be a positive number, got {step}");
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthConfig {
    /// REST backend root. `None` runs against the in-process backend.
    #[serde(default)]
    pub base_url:     Option<String>,
    pub timeout_secs: u64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { base_url: None, timeout_secs: 30 }
    }
}

#[derive(Debug, Clone, Deserialize)]
struct PricingFile {
    amount: f64,
    mpesa:  MpesaSection,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MpesaSection {
    till_number:   String,
    business_name: String,
}

#[derive(Debug, Clone, Deserialize)]
struct PurposesFile {
    purposes: Vec<PurposeConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct RuntimeFile {
    #[serde(default)]
    timing: TimingConfig,
    #[serde(default)]
    auth:   AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub payment:  PaymentConfig,
    pub purposes: Vec<PurposeConfig>,
    pub timing:   TimingConfig,
    pub auth:     AuthConfig,
}

impl AppConfig {
    /// Load from the data/ directory.
    /// `runtime.json` is optional; pricing and purposes are not.
    /// In tests, use AppConfig::default_test().
    pub fn load(data_dir: &str) -> anyhow::Result<Self> {
        let pricing_path = format!("{data_dir}/pricing.json");
        let pricing_content = std::fs::read_to_string(&pricing_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {pricing_path}: {e}"))?;
        let pricing: PricingFile = serde_json::from_str(&pricing_content)?;

        let purposes_path = format!("{data_dir}/purposes.json");
        let purposes_content = std::fs::read_to_string(&purposes_path)
            .map_err(|e| anyhow::anyhow!("Cannot read {purposes_path}: {e}"))?;
        let purposes_file: PurposesFile = serde_json::from_str(&purposes_content)?;
        if purposes_file.purposes.is_empty() {
            anyhow::bail!("{purposes_path} lists no report purposes");
        }

        let runtime_path = format!("{data_dir}/runtime.json");
        let runtime: RuntimeFile = if Path::new(&runtime_path).exists() {
            let content = std::fs::read_to_string(&runtime_path)
                .map_err(|e| anyhow::anyhow!("Cannot read {runtime_path}: {e}"))?;
            serde_json::from_str(&content)?
        } else {
            log::debug!("config: {runtime_path} absent, using default timings");
            RuntimeFile::default()
        };
        runtime
            .timing
            .validate()
            .map_err(|e| anyhow::anyhow!("{runtime_path}: {e}"))?;

        Ok(Self {
            payment: PaymentConfig {
                amount:        pricing.amount,
                till_number:   pricing.mpesa.till_number,
                business_name: pricing.mpesa.business_name,
            },
            purposes: purposes_file.purposes,
            timing:   runtime.timing,
            auth:     runtime.auth,
        })
    }

    /// Config with hardcoded defaults for use in unit tests.
    pub fn default_test() -> Self {
        let purpose = |id: &str, title: &str, icon: &str| PurposeConfig {
            id:    id.into(),
            title: title.into(),
            icon:  icon.into(),
        };
        Self {
            payment: PaymentConfig {
                amount:        100.0,
                till_number:   "5204479".into(),
                business_name: "FOOTBALL HIGHWAY ENTERPRISES".into(),
            },
            purposes: vec![
                purpose("loan", "Loan Application", "💰"),
                purpose("employment", "Employment", "💼"),
                purpose("housing", "Housing/Rental", "🏠"),
                purpose("business", "Business", "🏢"),
                purpose("personal", "Personal Review", "📊"),
                purpose("legal", "Legal Matters", "⚖️"),
            ],
            timing: TimingConfig::default(),
            auth:   AuthConfig::default(),
        }
    }

    pub fn purpose(&self, id: &str) -> Option<&PurposeConfig> {
        self.purposes.iter().find(|p| p.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loads_shipped_data_directory() {
        let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/../data");
        let cfg = AppConfig::load(dir).expect("load data/");
        assert_eq!(cfg.payment, AppConfig::default_test().payment);
        assert_eq!(cfg.purposes.len(), 6);
        assert!(cfg.purpose("legal").is_some());
    }

    #[test]
    fn runtime_file_is_optional() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pricing.json"),
            r#"{"amount": 250, "mpesa": {"tillNumber": "1", "businessName": "ACME"}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("purposes.json"),
            r#"{"purposes": [{"id": "loan", "title": "Loan", "icon": "$"}]}"#,
        )
        .unwrap();

        let cfg = AppConfig::load(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(cfg.payment.amount, 250.0);
        assert_eq!(cfg.timing, TimingConfig::default());
        assert_eq!(cfg.auth.base_url, None);
    }

    #[test]
    fn zero_or_negative_timings_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("pricing.json"),
            r#"{"amount": 100, "mpesa": {"tillNumber": "1", "businessName": "ACME"}}"#,
        )
        .unwrap();
        std::fs::write(
            dir.path().join("purposes.json"),
            r#"{"purposes": [{"id": "loan", "title": "Loan", "icon": "$"}]}"#,
        )
        .unwrap();

        let mut timing = TimingConfig { generation_interval_ms: 0, ..TimingConfig::default() };
        let write_timing = |timing: &TimingConfig| {
            let body = serde_json::json!({ "timing": timing });
            std::fs::write(dir.path().join("runtime.json"), body.to_string()).unwrap();
        };

        write_timing(&timing);
        let err = AppConfig::load(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("generation_interval_ms"), "{err}");

        timing = TimingConfig { signup_increment: -2.5, ..TimingConfig::default() };
        write_timing(&timing);
        let err = AppConfig::load(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("signup_increment"), "{err}");

        write_timing(&TimingConfig::default());
        assert!(AppConfig::load(dir.path().to_str().unwrap()).is_ok());
    }

    #[test]
    fn missing_pricing_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = AppConfig::load(dir.path().to_str().unwrap()).unwrap_err();
        assert!(err.to_string().contains("pricing.json"));
    }
}
