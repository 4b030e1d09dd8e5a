//! PII masking for outbound records.
//!
//! National IDs (CPF) leave the API partially redacted unless the caller
//! holds the reveal capability. Masking is fail-safe: anything that is not
//! recognizably a CPF passes through unchanged rather than being guessed
//! at, and masked output no longer matches either CPF shape, so a second
//! pass is a no-op.

use crate::store::Account;

/// Mask a CPF, keeping only the trailing digits.
///
/// - bare 11-digit form: all but the last 4 digits become `*`
/// - dot/dash formatted form (`ddd.ddd.ddd-dd`): the first two groups are
///   starred, punctuation positions preserved
/// - `None` stays `None`; malformed input is returned unchanged
pub fn mask_cpf(raw: Option<&str>) -> Option<String> {
    raw.map(mask_cpf_value)
}

fn mask_cpf_value(value: &str) -> String {
    if is_bare_cpf(value) {
        format!("{}{}", "*".repeat(7), &value[7..])
    } else if is_formatted_cpf(value) {
        format!("***.***. {}", &value[8..])
    } else {
        value.to_string()
    }
}

fn is_bare_cpf(value: &str) -> bool {
    value.len() == 11 && value.bytes().all(|b| b.is_ascii_digit())
}

fn is_formatted_cpf(value: &str) -> bool {
    value.len() == 14
        && value.bytes().enumerate().all(|(i, b)| match i {
            3 | 7 => b == b'.',
            11 => b == b'-',
            _ => b.is_ascii_digit(),
        })
}

/// Whether a value is acceptable as a CPF on input.
pub fn is_valid_cpf(value: &str) -> bool {
    is_bare_cpf(value) || is_formatted_cpf(value)
}

/// Shallow copy of an account with the CPF masked unless `reveal_full`.
pub fn mask_account(account: &Account, reveal_full: bool) -> Account {
    if reveal_full {
        return account.clone();
    }
    let mut masked = account.clone();
    masked.patient_cpf = mask_cpf(masked.patient_cpf.as_deref());
    masked
}

/// Batch variant; preserves order and cardinality.
pub fn mask_accounts(accounts: &[Account], reveal_full: bool) -> Vec<Account> {
    accounts
        .iter()
        .map(|a| mask_account(a, reveal_full))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn formatted_cpf_keeps_punctuation_positions() {
        assert_eq!(
            mask_cpf(Some("123.456.789-01")),
            Some("***.***. 789-01".to_string())
        );
    }

    #[test]
    fn bare_cpf_keeps_last_four_digits() {
        assert_eq!(mask_cpf(Some("12345678901")), Some("*******8901".to_string()));
    }

    #[test]
    fn none_stays_none() {
        assert_eq!(mask_cpf(None), None);
    }

    #[test]
    fn wrong_length_passes_through_unchanged() {
        assert_eq!(mask_cpf(Some("12345")), Some("12345".to_string()));
        assert_eq!(
            mask_cpf(Some("123.456.789-0")),
            Some("123.456.789-0".to_string())
        );
    }

    fn account(cpf: Option<&str>) -> Account {
        Account {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            patient_name: "João Pereira".into(),
            patient_cpf: cpf.map(str::to_string),
            insurer: "Bradesco Saúde".into(),
            amount_cents: 9_900,
            status: crate::store::AccountStatus::Pending,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn masking_twice_equals_masking_once() {
        for cpf in [Some("123.456.789-01"), Some("12345678901"), Some("12345"), None] {
            let original = account(cpf);
            let once = mask_account(&original, false);
            let twice = mask_account(&once, false);
            assert_eq!(once.patient_cpf, twice.patient_cpf);
        }
    }

    #[test]
    fn reveal_full_bypasses_masking() {
        let original = account(Some("12345678901"));
        let revealed = mask_account(&original, true);
        assert_eq!(revealed.patient_cpf.as_deref(), Some("12345678901"));
    }

    #[test]
    fn batch_preserves_order_and_cardinality() {
        let records = vec![
            account(Some("12345678901")),
            account(None),
            account(Some("123.456.789-01")),
        ];
        let masked = mask_accounts(&records, false);
        assert_eq!(masked.len(), 3);
        assert_eq!(masked[0].patient_cpf.as_deref(), Some("*******8901"));
        assert_eq!(masked[1].patient_cpf, None);
        assert_eq!(masked[2].patient_cpf.as_deref(), Some("***.***. 789-01"));
    }
}
