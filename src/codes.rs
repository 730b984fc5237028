//! Enumerated code values carried by ACH records.

use std::fmt;
use std::str::FromStr;

/// Entry detail transaction code: account type, direction and prenote flag.
///
/// Codes outside the known set are kept as [`TransactionCode::Unknown`] and
/// still classified by the same digit arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionCode {
    CheckingCredit,
    CheckingCreditPrenote,
    CheckingDebit,
    CheckingDebitPrenote,
    SavingsCredit,
    SavingsCreditPrenote,
    SavingsDebit,
    SavingsDebitPrenote,
    Unknown(u8),
}

impl TransactionCode {
    pub fn code(self) -> u8 {
        match self {
            TransactionCode::CheckingCredit => 22,
            TransactionCode::CheckingCreditPrenote => 23,
            TransactionCode::CheckingDebit => 27,
            TransactionCode::CheckingDebitPrenote => 28,
            TransactionCode::SavingsCredit => 32,
            TransactionCode::SavingsCreditPrenote => 33,
            TransactionCode::SavingsDebit => 37,
            TransactionCode::SavingsDebitPrenote => 38,
            TransactionCode::Unknown(code) => code,
        }
    }

    pub fn is_credit(self) -> bool {
        self.code() % 10 < 5
    }

    pub fn is_debit(self) -> bool {
        self.code() % 10 >= 5
    }

    /// Zero-dollar dry run validating the receiving account.
    pub fn is_prenote(self) -> bool {
        matches!(self.code() % 10, 3 | 8)
    }

    pub fn is_checking(self) -> bool {
        self.code() / 10 == 2
    }

    pub fn is_savings(self) -> bool {
        self.code() / 10 == 3
    }
}

impl From<u8> for TransactionCode {
    fn from(code: u8) -> Self {
        match code {
            22 => TransactionCode::CheckingCredit,
            23 => TransactionCode::CheckingCreditPrenote,
            27 => TransactionCode::CheckingDebit,
            28 => TransactionCode::CheckingDebitPrenote,
            32 => TransactionCode::SavingsCredit,
            33 => TransactionCode::SavingsCreditPrenote,
            37 => TransactionCode::SavingsDebit,
            38 => TransactionCode::SavingsDebitPrenote,
            other => TransactionCode::Unknown(other),
        }
    }
}

impl fmt::Display for TransactionCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.code())
    }
}

/// Standard entry class code of a batch.
#[allow(clippy::upper_case_acronyms)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StandardEntryClass {
    PPD,
    ARC,
    BOC,
    CCD,
    CIE,
    CTX,
    IAT,
    POP,
    RCK,
    TEL,
    WEB,
}

impl StandardEntryClass {
    pub const ALL: [StandardEntryClass; 11] = [
        StandardEntryClass::PPD,
        StandardEntryClass::ARC,
        StandardEntryClass::BOC,
        StandardEntryClass::CCD,
        StandardEntryClass::CIE,
        StandardEntryClass::CTX,
        StandardEntryClass::IAT,
        StandardEntryClass::POP,
        StandardEntryClass::RCK,
        StandardEntryClass::TEL,
        StandardEntryClass::WEB,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StandardEntryClass::PPD => "PPD",
            StandardEntryClass::ARC => "ARC",
            StandardEntryClass::BOC => "BOC",
            StandardEntryClass::CCD => "CCD",
            StandardEntryClass::CIE => "CIE",
            StandardEntryClass::CTX => "CTX",
            StandardEntryClass::IAT => "IAT",
            StandardEntryClass::POP => "POP",
            StandardEntryClass::RCK => "RCK",
            StandardEntryClass::TEL => "TEL",
            StandardEntryClass::WEB => "WEB",
        }
    }
}

impl FromStr for StandardEntryClass {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        StandardEntryClass::ALL
            .into_iter()
            .find(|sec| sec.as_str().eq_ignore_ascii_case(code))
            .ok_or_else(|| format!("unknown standard entry class code \"{}\"", code))
    }
}

impl fmt::Display for StandardEntryClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether a batch carries credits, debits or both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceClassCode {
    Mixed,
    Credits,
    Debits,
}

impl ServiceClassCode {
    pub fn code(self) -> u16 {
        match self {
            ServiceClassCode::Mixed => 200,
            ServiceClassCode::Credits => 220,
            ServiceClassCode::Debits => 225,
        }
    }

    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            200 => Some(ServiceClassCode::Mixed),
            220 => Some(ServiceClassCode::Credits),
            225 => Some(ServiceClassCode::Debits),
            _ => None,
        }
    }
}

impl fmt::Display for ServiceClassCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_code_classification() {
        let credit = TransactionCode::from(22);
        assert_eq!(credit, TransactionCode::CheckingCredit);
        assert!(credit.is_credit() && !credit.is_debit());
        assert!(credit.is_checking() && !credit.is_savings());
        assert!(!credit.is_prenote());

        let prenote = TransactionCode::from(38);
        assert!(prenote.is_debit() && prenote.is_savings() && prenote.is_prenote());

        let debit = TransactionCode::from(27);
        assert!(debit.is_debit() && !debit.is_credit());
    }

    #[test]
    fn test_unknown_transaction_code_keeps_raw_value() {
        let code = TransactionCode::from(21);
        assert_eq!(code, TransactionCode::Unknown(21));
        assert_eq!(code.code(), 21);
        assert!(code.is_credit());
        assert!(code.is_checking());
        assert_eq!(TransactionCode::from(5).to_string(), "05");
    }

    #[test]
    fn test_every_known_code_round_trips() {
        for code in [22u8, 23, 27, 28, 32, 33, 37, 38] {
            let tc = TransactionCode::from(code);
            assert!(!matches!(tc, TransactionCode::Unknown(_)));
            assert_eq!(tc.code(), code);
        }
    }

    #[test]
    fn test_standard_entry_class_parsing() {
        assert_eq!("PPD".parse::<StandardEntryClass>(), Ok(StandardEntryClass::PPD));
        assert_eq!("web".parse::<StandardEntryClass>(), Ok(StandardEntryClass::WEB));
        assert!("XYZ".parse::<StandardEntryClass>().is_err());
        assert_eq!(StandardEntryClass::CCD.to_string(), "CCD");
    }

    #[test]
    fn test_service_class_code() {
        assert_eq!(ServiceClassCode::from_code(200), Some(ServiceClassCode::Mixed));
        assert_eq!(ServiceClassCode::Debits.to_string(), "225");
        assert_eq!(ServiceClassCode::from_code(201), None);
    }
}
