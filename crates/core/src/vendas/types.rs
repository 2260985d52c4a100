//! Sale domain types.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Sale lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusVenda {
    /// Open, fully editable.
    Aberta,
    /// Completed.
    Concluida,
    /// Cancelled.
    Cancelada,
}

impl StatusVenda {
    /// Stored representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Aberta => "aberta",
            Self::Concluida => "concluida",
            Self::Cancelada => "cancelada",
        }
    }
}

impl fmt::Display for StatusVenda {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StatusVenda {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "aberta" => Ok(Self::Aberta),
            "concluida" => Ok(Self::Concluida),
            "cancelada" => Ok(Self::Cancelada),
            other => Err(format!("status de venda desconhecido: {other}")),
        }
    }
}

/// A sale line as submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemInput {
    /// Sold product.
    pub produto_id: Option<Uuid>,
    /// Sold service.
    pub servico_id: Option<Uuid>,
    /// Line description.
    pub descricao: String,
    /// Quantity, > 0.
    pub quantidade: Decimal,
    /// Unit price, >= 0.
    pub preco_unitario: Decimal,
    /// Line discount.
    #[serde(default)]
    pub desconto: Decimal,
}

/// A validated sale line with its total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemCalculado {
    /// Input line.
    #[serde(flatten)]
    pub item: ItemInput,
    /// `quantidade * preco_unitario - desconto`, 2 places.
    pub total: Decimal,
}

/// Result of pricing a whole sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TotaisVenda {
    /// Priced lines.
    pub itens: Vec<ItemCalculado>,
    /// Sum of line totals.
    pub subtotal: Decimal,
    /// Sale-level discount.
    pub desconto: Decimal,
    /// `subtotal - desconto`.
    pub total: Decimal,
}

/// One installment of the receivable schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Parcela {
    /// 1-based installment number.
    pub numero: i32,
    /// Amount due.
    pub valor: Decimal,
    /// Due date.
    pub vencimento: NaiveDate,
}
