use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;

/// Which side of the ledger a titulo belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TipoTitulo {
    /// Accounts payable.
    Pagamento,
    /// Accounts receivable.
    Recebimento,
}

/// Stored status of a payable/receivable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusTitulo {
    /// Nothing settled yet.
    Pendente,
    /// Partially settled.
    Parcial,
    /// Fully settled (`pago` / `recebido`).
    Liquidado,
    /// Cancelled.
    Cancelado,
}

impl StatusTitulo {
    /// Stored representation for the given kind.
    #[must_use]
    pub const fn as_str(self, tipo: TipoTitulo) -> &'static str {
        match (self, tipo) {
            (Self::Pendente, _) => "pendente",
            (Self::Parcial, _) => "parcial",
            (Self::Liquidado, TipoTitulo::Pagamento) => "pago",
            (Self::Liquidado, TipoTitulo::Recebimento) => "recebido",
            (Self::Cancelado, _) => "cancelado",
        }
    }

    /// Parses a stored status of either kind.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "pendente" => Some(Self::Pendente),
            "parcial" => Some(Self::Parcial),
            "pago" | "recebido" => Some(Self::Liquidado),
            "cancelado" => Some(Self::Cancelado),
            _ => None,
        }
    }

    /// Pending or partial.
    #[must_use]
    pub const fn em_aberto(self) -> bool {
        matches!(self, Self::Pendente | Self::Parcial)
    }
}

/// The amounts a settlement decision depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Titulo {
    /// Face value.
    pub valor: Decimal,
    /// Amount settled so far.
    pub valor_liquidado: Decimal,
    /// Current status.
    pub status: StatusTitulo,
    /// Due date.
    pub vencimento: NaiveDate,
}

impl Titulo {
    /// Amount still open.
    #[must_use]
    pub fn saldo(&self) -> Decimal {
        self.valor - self.valor_liquidado
    }
}

/// New state after a settlement.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Baixa {
    /// Accumulated settled amount.
    pub valor_liquidado: Decimal,
    /// Resulting status.
    pub status: StatusTitulo,
}

/// Totals reported by the `resumo` endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResumoFinanceiro {
    /// Open balance of pending/partial items.
    pub total_aberto: Decimal,
    /// Part of `total_aberto` already overdue.
    pub total_vencido: Decimal,
    /// Settled amounts (including partial settlements).
    pub total_liquidado: Decimal,
    /// Pending/partial items.
    pub quantidade_aberta: u64,
    /// Overdue items.
    pub quantidade_vencida: u64,
}
