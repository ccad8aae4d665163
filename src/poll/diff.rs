//! Snapshot comparison, one pure function per stream.
//!
//! All comparisons are exact decimal/value equality. A missing previous
//! snapshot means the stream has no baseline yet (first fetch, or after a
//! reset); it always yields a notification flagged `first_time` and is never
//! compared field-by-field.

use std::collections::BTreeSet;
use std::ops::{BitOr, BitOrAssign};

use rust_decimal::Decimal;

use crate::models::Currency;
use crate::utils::{AccountSnapshot, FeeSnapshot, OrdersListSnapshot, TickerSnapshot};

pub trait ChangeDescriptor {
    fn changed(&self) -> bool;
}

/// Which ticker movements cause a price notification. Triggers combine with `|`;
/// the empty set means "always notify".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct PriceTrigger(u8);

impl PriceTrigger {
    pub const ALWAYS: PriceTrigger = PriceTrigger(0);
    pub const BUY: PriceTrigger = PriceTrigger(1);
    pub const SELL: PriceTrigger = PriceTrigger(2);
    pub const BUY_UP: PriceTrigger = PriceTrigger(4);
    pub const BUY_DOWN: PriceTrigger = PriceTrigger(8);
    pub const SELL_UP: PriceTrigger = PriceTrigger(16);
    pub const SELL_DOWN: PriceTrigger = PriceTrigger(32);

    const MASK: u8 = 63;

    pub fn bits(self) -> u8 {
        self.0
    }

    pub fn from_bits(bits: u8) -> PriceTrigger {
        PriceTrigger(bits & Self::MASK)
    }

    pub fn is_always(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, other: PriceTrigger) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub fn from_name(name: &str) -> Option<PriceTrigger> {
        match name.trim().to_lowercase().as_str() {
            "always" => Some(PriceTrigger::ALWAYS),
            "buy" => Some(PriceTrigger::BUY),
            "sell" => Some(PriceTrigger::SELL),
            "buy_up" => Some(PriceTrigger::BUY_UP),
            "buy_down" => Some(PriceTrigger::BUY_DOWN),
            "sell_up" => Some(PriceTrigger::SELL_UP),
            "sell_down" => Some(PriceTrigger::SELL_DOWN),
            _ => None,
        }
    }
}

impl BitOr for PriceTrigger {
    type Output = PriceTrigger;

    fn bitor(self, rhs: PriceTrigger) -> PriceTrigger {
        PriceTrigger(self.0 | rhs.0)
    }
}

impl BitOrAssign for PriceTrigger {
    fn bitor_assign(&mut self, rhs: PriceTrigger) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PriceMovement {
    pub buy_up: bool,
    pub buy_down: bool,
    pub sell_up: bool,
    pub sell_down: bool,
}

impl PriceMovement {
    pub fn between(previous: &TickerSnapshot, current: &TickerSnapshot) -> PriceMovement {
        PriceMovement {
            buy_up: current.buy > previous.buy,
            buy_down: current.buy < previous.buy,
            sell_up: current.sell > previous.sell,
            sell_down: current.sell < previous.sell,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.buy_up || self.buy_down || self.sell_up || self.sell_down)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickerChange {
    pub changed: bool,
    pub first_time: bool,
    pub movement: PriceMovement,
}

impl ChangeDescriptor for TickerChange {
    fn changed(&self) -> bool {
        self.changed
    }
}

pub fn ticker(
    previous: Option<&TickerSnapshot>,
    current: &TickerSnapshot,
    trigger: PriceTrigger,
) -> TickerChange {
    let Some(previous) = previous else {
        return TickerChange {
            changed: true,
            first_time: true,
            movement: PriceMovement::default(),
        };
    };

    let movement = PriceMovement::between(previous, current);
    let changed = trigger.is_always()
        || (trigger.contains(PriceTrigger::BUY) && (movement.buy_up || movement.buy_down))
        || (trigger.contains(PriceTrigger::SELL) && (movement.sell_up || movement.sell_down))
        || (trigger.contains(PriceTrigger::BUY_UP) && movement.buy_up)
        || (trigger.contains(PriceTrigger::BUY_DOWN) && movement.buy_down)
        || (trigger.contains(PriceTrigger::SELL_UP) && movement.sell_up)
        || (trigger.contains(PriceTrigger::SELL_DOWN) && movement.sell_down);

    TickerChange {
        changed,
        first_time: false,
        movement,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeeChange {
    pub changed: bool,
    pub previous: Option<Decimal>,
}

impl ChangeDescriptor for FeeChange {
    fn changed(&self) -> bool {
        self.changed
    }
}

pub fn fee(previous: Option<&FeeSnapshot>, current: &FeeSnapshot) -> FeeChange {
    let previous = previous.map(|fee| fee.trade);
    FeeChange {
        changed: previous != Some(current.trade),
        previous,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AccountChange {
    pub first_time: bool,
    pub rights_changed: bool,
    pub open_orders_changed: bool,
    /// Currencies whose balance differs, in currency order.
    pub changed_currencies: Vec<Currency>,
}

impl AccountChange {
    pub fn currency_amount_changed(&self) -> bool {
        !self.changed_currencies.is_empty()
    }
}

impl ChangeDescriptor for AccountChange {
    fn changed(&self) -> bool {
        self.first_time
            || self.rights_changed
            || self.open_orders_changed
            || self.currency_amount_changed()
    }
}

pub fn account(previous: Option<&AccountSnapshot>, current: &AccountSnapshot) -> AccountChange {
    let Some(previous) = previous else {
        return AccountChange {
            first_time: true,
            ..AccountChange::default()
        };
    };

    // a currency missing on one side counts as a zero balance
    let currencies: BTreeSet<Currency> = previous
        .funds
        .keys()
        .chain(current.funds.keys())
        .copied()
        .collect();
    let changed_currencies = currencies
        .into_iter()
        .filter(|currency| previous.balance(*currency) != current.balance(*currency))
        .collect();

    AccountChange {
        first_time: false,
        rights_changed: previous.rights != current.rights,
        open_orders_changed: previous.open_orders != current.open_orders,
        changed_currencies,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrdersChange {
    pub first_time: bool,
    pub count_changed: bool,
    pub amount_changed: bool,
    /// Aggregates of the previous snapshot; `None` while they are unknown.
    pub previous_count: Option<usize>,
    pub previous_amount: Option<Decimal>,
}

impl ChangeDescriptor for OrdersChange {
    fn changed(&self) -> bool {
        self.first_time || self.count_changed || self.amount_changed
    }
}

pub fn active_orders(
    previous: Option<&OrdersListSnapshot>,
    current: &OrdersListSnapshot,
) -> OrdersChange {
    let Some(previous) = previous else {
        return OrdersChange {
            first_time: true,
            ..OrdersChange::default()
        };
    };

    let previous_count = previous.count();
    let previous_amount = previous.total_amount();
    OrdersChange {
        first_time: false,
        count_changed: previous_count != current.count(),
        amount_changed: previous_amount != current.total_amount(),
        previous_count: Some(previous_count),
        previous_amount: Some(previous_amount),
    }
}
