//! Shop purchases.
//!
//! A purchase checks affordability first and the ownership cap second; the
//! first failing check is reported. On success the price is debited, the
//! item's power boost is added to mining power, one unit is granted and a
//! negative ledger entry is staged, all in one [`UserChange`].
//!
//! [`UserChange`]: crate::store::UserChange

use rust_decimal::Decimal;

use coinmine_ledger::Journal;
use coinmine_types::{ShopItem, User};

use crate::error::EconomyError;
use crate::store::ItemGrant;

/// Check whether `user`, owning `owned` units already, may buy `item`.
///
/// # Errors
///
/// Returns [`EconomyError::InsufficientFunds`] if the balance is below the
/// price, otherwise [`EconomyError::MaxQuantityReached`] if the cap is hit.
pub fn check(user: &User, item: &ShopItem, owned: u32) -> Result<(), EconomyError> {
    if user.balance < item.price {
        return Err(EconomyError::InsufficientFunds {
            balance: user.balance,
            price: item.price,
        });
    }
    if let Some(max_quantity) = item.max_quantity {
        if owned >= max_quantity {
            return Err(EconomyError::MaxQuantityReached {
                item_id: item.id,
                max_quantity,
            });
        }
    }
    Ok(())
}

/// Debit the price and add the boost, staging the purchase entry.
///
/// Returns the inventory grant to commit with the change.
///
/// # Errors
///
/// Returns [`EconomyError::InsufficientFunds`] if the debit would make the
/// balance negative, [`EconomyError::Overflow`] on overflow, or
/// [`EconomyError::Ledger`] if the entry cannot be staged.
pub fn apply(
    user: &mut User,
    item: &ShopItem,
    journal: &mut Journal,
) -> Result<ItemGrant, EconomyError> {
    let balance = user
        .balance
        .checked_sub(item.price)
        .ok_or(EconomyError::Overflow("debiting the price"))?;
    if balance < Decimal::ZERO {
        return Err(EconomyError::InsufficientFunds {
            balance: user.balance,
            price: item.price,
        });
    }
    user.balance = balance;
    user.mining_power = user
        .mining_power
        .checked_add(item.power_boost)
        .ok_or(EconomyError::Overflow("adding the power boost"))?;
    if item.price > Decimal::ZERO {
        journal.record_purchase(item.price, &item.name)?;
    }

    Ok(ItemGrant {
        item_id: item.id,
        max_quantity: item.max_quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use coinmine_types::ItemId;

    fn item(price: i64, max_quantity: Option<u32>) -> ShopItem {
        ShopItem {
            id: ItemId::new(),
            slug: "drill".to_owned(),
            name: "Power Drill".to_owned(),
            description: String::new(),
            icon: String::new(),
            price: Decimal::from(price),
            power_boost: Decimal::from(5),
            max_quantity,
        }
    }

    fn buyer(balance: i64) -> User {
        let mut user = User::new_player(1, "b".to_owned(), 100, Utc::now());
        user.balance = Decimal::from(balance);
        user
    }

    #[test]
    fn insufficient_funds() {
        let result = check(&buyer(10), &item(50, None), 0);
        assert!(matches!(result, Err(EconomyError::InsufficientFunds { .. })));
    }

    #[test]
    fn funds_checked_before_cap() {
        let result = check(&buyer(10), &item(50, Some(1)), 1);
        assert!(matches!(result, Err(EconomyError::InsufficientFunds { .. })));
    }

    #[test]
    fn cap_reached() {
        let result = check(&buyer(100), &item(50, Some(2)), 2);
        assert!(matches!(
            result,
            Err(EconomyError::MaxQuantityReached { max_quantity: 2, .. })
        ));
    }

    #[test]
    fn unbounded_item_never_capped() {
        assert!(check(&buyer(100), &item(50, None), 10_000).is_ok());
    }

    #[test]
    fn exact_balance_is_enough() {
        assert!(check(&buyer(50), &item(50, Some(1)), 0).is_ok());
    }

    #[test]
    fn apply_debits_and_boosts() {
        let mut user = buyer(80);
        let drill = item(50, Some(3));
        let mut journal = Journal::new(user.id, Utc::now());
        let grant = apply(&mut user, &drill, &mut journal).ok();

        assert_eq!(grant.map(|g| g.item_id), Some(drill.id));
        assert_eq!(user.balance, Decimal::from(30));
        assert_eq!(user.mining_power, Decimal::from(6));
        assert_eq!(journal.net_amount().ok(), Some(Decimal::from(-50)));
    }
}
