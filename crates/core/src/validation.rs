//! Field validation shared by every resource.
//!
//! Validators push messages into a [`FieldErrors`] map instead of failing fast, so a
//! single response can report every invalid field.

use std::collections::BTreeMap;
use std::fmt;

use rust_decimal::Decimal;
use serde::Serialize;

use gestor_shared::AppError;

/// Per-field validation messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a collection holding one message.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    /// Records a message for `field`.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Returns true when `field` has at least one message.
    #[must_use]
    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// Returns true when no field failed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with errors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Moves every message of `other` into `self`.
    pub fn merge(&mut self, other: Self) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(())` when empty, otherwise `Err(self)`.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            if !first {
                f.write_str("; ")?;
            }
            first = false;
            write!(f, "{field}: {}", messages.join(", "))?;
        }
        Ok(())
    }
}

impl std::error::Error for FieldErrors {}

impl From<FieldErrors> for AppError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors.to_string())
    }
}

/// Unidades federativas accepted in addresses.
pub const UFS: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Keeps only ASCII digits.
#[must_use]
pub fn somente_digitos(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Requires a non-blank value no longer than `max` characters.
pub fn text(errors: &mut FieldErrors, field: &str, value: &str, max: usize) {
    if value.trim().is_empty() {
        errors.add(field, "campo obrigatorio");
    } else if value.chars().count() > max {
        errors.add(field, format!("deve ter no maximo {max} caracteres"));
    }
}

/// Same as [`text`] for optional values; `None` passes.
pub fn optional_text(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        text(errors, field, value, max);
    }
}

/// Minimal structural e-mail check: `local@dominio.tld`, no spaces.
#[must_use]
pub fn email_valido(value: &str) -> bool {
    let value = value.trim();
    if value.len() > 254 || value.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Validates an e-mail field.
pub fn email(errors: &mut FieldErrors, field: &str, value: &str) {
    if !email_valido(value) {
        errors.add(field, "e-mail invalido");
    }
}

/// Validates an optional e-mail field.
pub fn optional_email(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        email(errors, field, value);
    }
}

fn digitos(value: &str) -> Vec<u32> {
    value.chars().filter_map(|c| c.to_digit(10)).collect()
}

fn todos_iguais(digits: &[u32]) -> bool {
    digits.windows(2).all(|w| w[0] == w[1])
}

fn digito_cpf(digits: &[u32]) -> u32 {
    let peso_inicial = u32::try_from(digits.len()).unwrap_or(0) + 1;
    let soma: u32 = digits
        .iter()
        .zip((2..=peso_inicial).rev())
        .map(|(d, peso)| d * peso)
        .sum();
    let resto = (soma * 10) % 11;
    if resto == 10 { 0 } else { resto }
}

fn digito_cnpj(digits: &[u32]) -> u32 {
    const PESOS: [u32; 13] = [6, 5, 4, 3, 2, 9, 8, 7, 6, 5, 4, 3, 2];
    let pesos = &PESOS[PESOS.len() - digits.len()..];
    let soma: u32 = digits.iter().zip(pesos).map(|(d, p)| d * p).sum();
    let resto = soma % 11;
    if resto < 2 { 0 } else { 11 - resto }
}

/// Checks a CPF (11 digits, punctuation ignored) including both check digits.
#[must_use]
pub fn cpf_valido(value: &str) -> bool {
    let digits = digitos(value);
    if somente_digitos(value).len() != 11 || todos_iguais(&digits) {
        return false;
    }
    digito_cpf(&digits[..9]) == digits[9] && digito_cpf(&digits[..10]) == digits[10]
}

/// Checks a CNPJ (14 digits, punctuation ignored) including both check digits.
#[must_use]
pub fn cnpj_valido(value: &str) -> bool {
    let digits = digitos(value);
    if somente_digitos(value).len() != 14 || todos_iguais(&digits) {
        return false;
    }
    digito_cnpj(&digits[..12]) == digits[12] && digito_cnpj(&digits[..13]) == digits[13]
}

/// Appends the check digits to a 9-digit CPF base.
#[must_use]
pub fn completar_cpf(base: &str) -> Option<String> {
    let mut digits = digitos(base);
    if digits.len() != 9 {
        return None;
    }
    let primeiro = digito_cpf(&digits);
    digits.push(primeiro);
    let segundo = digito_cpf(&digits);
    Some(format!("{}{primeiro}{segundo}", somente_digitos(base)))
}

/// Appends the check digits to a 12-digit CNPJ base.
#[must_use]
pub fn completar_cnpj(base: &str) -> Option<String> {
    let mut digits = digitos(base);
    if digits.len() != 12 {
        return None;
    }
    let primeiro = digito_cnpj(&digits);
    digits.push(primeiro);
    let segundo = digito_cnpj(&digits);
    Some(format!("{}{primeiro}{segundo}", somente_digitos(base)))
}

/// Validates a CPF field.
pub fn cpf(errors: &mut FieldErrors, field: &str, value: &str) {
    if !cpf_valido(value) {
        errors.add(field, "CPF invalido");
    }
}

/// Validates a CNPJ field.
pub fn cnpj(errors: &mut FieldErrors, field: &str, value: &str) {
    if !cnpj_valido(value) {
        errors.add(field, "CNPJ invalido");
    }
}

/// Validates a CEP (8 digits).
pub fn optional_cep(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value
        && somente_digitos(value).len() != 8
    {
        errors.add(field, "CEP invalido");
    }
}

/// Validates a phone number (10 or 11 digits with area code).
pub fn optional_telefone(errors: &mut FieldErrors, field: &str, value: Option<&str>) {
    if let Some(value) = value {
        let len = somente_digitos(value).len();
        if !(10..=11).contains(&len) {
            errors.add(field, "telefone invalido");
        }
    }
}

/// Validates a state abbreviation.
pub fn uf(errors: &mut FieldErrors, field: &str, value: &str) {
    let upper = value.trim().to_uppercase();
    if !UFS.contains(&upper.as_str()) {
        errors.add(field, "UF invalida");
    }
}

/// Requires `value >= 0`.
pub fn non_negative(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value < Decimal::ZERO {
        errors.add(field, "nao pode ser negativo");
    }
}

/// Requires `value > 0`.
pub fn positive(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value <= Decimal::ZERO {
        errors.add(field, "deve ser maior que zero");
    }
}

/// Requires one of the listed values.
pub fn one_of(errors: &mut FieldErrors, field: &str, value: &str, allowed: &[&str]) {
    if !allowed.contains(&value) {
        errors.add(field, format!("deve ser um de: {}", allowed.join(", ")));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case("529.982.247-25", true)]
    #[case("52998224725", true)]
    #[case("111.444.777-35", true)]
    #[case("529.982.247-26", false)]
    #[case("111.111.111-11", false)]
    #[case("1234567890", false)]
    #[case("", false)]
    fn test_cpf(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(cpf_valido(value), expected);
    }

    #[rstest]
    #[case("11.222.333/0001-81", true)]
    #[case("11222333000181", true)]
    #[case("11.222.333/0001-82", false)]
    #[case("00.000.000/0000-00", false)]
    #[case("1122233300018", false)]
    fn test_cnpj(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(cnpj_valido(value), expected);
    }

    #[test]
    fn test_completar_documentos() {
        assert_eq!(completar_cpf("529982247").as_deref(), Some("52998224725"));
        assert_eq!(completar_cnpj("112223330001").as_deref(), Some("11222333000181"));
        assert!(completar_cpf("123").is_none());

        for base in ["123456789", "987654321", "100200300"] {
            assert!(cpf_valido(&completar_cpf(base).unwrap()));
        }
        for base in ["123456780001", "987654320001", "100200300001"] {
            assert!(cnpj_valido(&completar_cnpj(base).unwrap()));
        }
    }

    #[rstest]
    #[case("vendas@loja.com.br", true)]
    #[case("a@b.co", true)]
    #[case("sem-arroba.com", false)]
    #[case("dois@@loja.com", false)]
    #[case("espaco @loja.com", false)]
    #[case("fim@loja.", false)]
    #[case("@loja.com", false)]
    fn test_email(#[case] value: &str, #[case] expected: bool) {
        assert_eq!(email_valido(value), expected);
    }

    #[test]
    fn test_collects_every_field() {
        let mut errors = FieldErrors::new();
        text(&mut errors, "nome", "  ", 100);
        email(&mut errors, "email", "invalido");
        optional_cep(&mut errors, "cep", Some("123"));
        optional_telefone(&mut errors, "telefone", Some("(11) 98765-4321"));
        uf(&mut errors, "uf", "sp");
        non_negative(&mut errors, "preco", dec!(-0.01));
        positive(&mut errors, "quantidade", dec!(0));

        assert_eq!(errors.len(), 5);
        assert!(errors.contains("nome"));
        assert!(errors.contains("email"));
        assert!(errors.contains("cep"));
        assert!(errors.contains("preco"));
        assert!(errors.contains("quantidade"));
        assert!(!errors.contains("telefone"));
        assert!(!errors.contains("uf"));
    }

    #[test]
    fn test_text_max_len() {
        let mut errors = FieldErrors::new();
        text(&mut errors, "nome", &"x".repeat(11), 10);
        assert_eq!(
            errors.get("nome"),
            Some(&["deve ter no maximo 10 caracteres".to_string()][..])
        );
    }

    #[test]
    fn test_merge_and_result() {
        let mut errors = FieldErrors::single("a", "um");
        errors.merge(FieldErrors::single("a", "dois"));
        assert_eq!(errors.get("a").map(<[String]>::len), Some(2));
        assert!(errors.clone().into_result().is_err());
        assert!(FieldErrors::new().into_result().is_ok());
        assert_eq!(errors.to_string(), "a: um, dois");
    }
}
