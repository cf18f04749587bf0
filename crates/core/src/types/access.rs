//! Roles, capabilities and ownership checks.
//!
//! Handlers never branch on a role directly. A [`Role`] grants a set of
//! [`Capability`] values, and every ownership check asks for the capability
//! it needs.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::id::{RestaurantId, UserId};

/// Kind of account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "user_role", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Orders food.
    Customer,
    /// Runs one or more restaurants.
    Owner,
}

impl Role {
    /// Whether this role carries `capability`.
    #[must_use]
    pub const fn grants(&self, capability: Capability) -> bool {
        matches!(
            (self, capability),
            (Self::Customer, Capability::PlaceOrders | Capability::ViewOwnOrders)
                | (
                    Self::Owner,
                    Capability::ManageRestaurantOrders | Capability::ManageCatalog
                )
        )
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "owner" => Ok(Self::Owner),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

/// Something a caller may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Create orders as a customer.
    PlaceOrders,
    /// Read orders one placed.
    ViewOwnOrders,
    /// Read, filter, analyze and advance orders of owned restaurants.
    ManageRestaurantOrders,
    /// Change products of owned restaurants.
    ManageCatalog,
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::PlaceOrders => "place orders",
            Self::ViewOwnOrders => "view own orders",
            Self::ManageRestaurantOrders => "manage restaurant orders",
            Self::ManageCatalog => "manage catalog",
        })
    }
}

/// Authorization failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessDenied {
    /// The caller's role lacks the capability.
    #[error("Not enough privileges: {0} is not allowed")]
    MissingCapability(Capability),
    /// The caller has the capability but not over this entity.
    #[error("Not enough privileges. This entity does not belong to you")]
    NotOwner,
}

/// Who owns an order, from both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderOwnership {
    pub customer_id: UserId,
    pub restaurant_id: RestaurantId,
    pub restaurant_owner_id: UserId,
}

/// The authenticated caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    #[must_use]
    pub const fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    /// Require a capability.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied::MissingCapability`] if the role lacks it.
    pub const fn require(&self, capability: Capability) -> Result<(), AccessDenied> {
        if self.role.grants(capability) {
            Ok(())
        } else {
            Err(AccessDenied::MissingCapability(capability))
        }
    }

    /// Require a capability over a restaurant owned by `owner_id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the capability is missing or the caller is not the
    /// owner.
    pub fn require_restaurant(
        &self,
        capability: Capability,
        owner_id: UserId,
    ) -> Result<(), AccessDenied> {
        self.require(capability)?;
        if owner_id == self.user_id {
            Ok(())
        } else {
            Err(AccessDenied::NotOwner)
        }
    }

    /// Whether the caller may see an order.
    ///
    /// Customers see orders they placed; owners see orders of their
    /// restaurants.
    ///
    /// # Errors
    ///
    /// Returns [`AccessDenied::NotOwner`] when neither side matches.
    pub fn authorize_order(&self, order: &OrderOwnership) -> Result<(), AccessDenied> {
        let as_customer = self.role.grants(Capability::ViewOwnOrders)
            && order.customer_id == self.user_id;
        let as_owner = self.role.grants(Capability::ManageRestaurantOrders)
            && order.restaurant_owner_id == self.user_id;

        if as_customer || as_owner {
            Ok(())
        } else {
            Err(AccessDenied::NotOwner)
        }
    }

    /// Whether the caller may advance an order's lifecycle.
    ///
    /// # Errors
    ///
    /// Returns an error unless the caller manages the order's restaurant.
    pub fn authorize_order_management(&self, order: &OrderOwnership) -> Result<(), AccessDenied> {
        self.require_restaurant(Capability::ManageRestaurantOrders, order.restaurant_owner_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CUSTOMER: Principal = Principal::new(UserId::new(1), Role::Customer);
    const OTHER_CUSTOMER: Principal = Principal::new(UserId::new(2), Role::Customer);
    const OWNER: Principal = Principal::new(UserId::new(10), Role::Owner);
    const OTHER_OWNER: Principal = Principal::new(UserId::new(11), Role::Owner);

    const ORDER: OrderOwnership = OrderOwnership {
        customer_id: UserId::new(1),
        restaurant_id: RestaurantId::new(100),
        restaurant_owner_id: UserId::new(10),
    };

    #[test]
    fn test_role_capabilities() {
        assert!(Role::Customer.grants(Capability::PlaceOrders));
        assert!(!Role::Customer.grants(Capability::ManageRestaurantOrders));
        assert!(Role::Owner.grants(Capability::ManageCatalog));
        assert!(!Role::Owner.grants(Capability::PlaceOrders));
    }

    #[test]
    fn test_order_visible_to_its_customer_and_owner() {
        assert!(CUSTOMER.authorize_order(&ORDER).is_ok());
        assert!(OWNER.authorize_order(&ORDER).is_ok());
    }

    #[test]
    fn test_other_customer_forbidden() {
        assert_eq!(
            OTHER_CUSTOMER.authorize_order(&ORDER),
            Err(AccessDenied::NotOwner)
        );
    }

    #[test]
    fn test_other_owner_forbidden() {
        assert_eq!(
            OTHER_OWNER.authorize_order(&ORDER),
            Err(AccessDenied::NotOwner)
        );
    }

    #[test]
    fn test_owner_with_customer_id_collision_is_not_customer() {
        // An owner whose id happens to equal the order's customer id must not
        // gain customer visibility.
        let owner = Principal::new(UserId::new(1), Role::Owner);
        assert!(owner.authorize_order(&ORDER).is_err());
    }

    #[test]
    fn test_customer_cannot_manage_orders() {
        assert_eq!(
            CUSTOMER.authorize_order_management(&ORDER),
            Err(AccessDenied::MissingCapability(
                Capability::ManageRestaurantOrders
            ))
        );
        assert!(OWNER.authorize_order_management(&ORDER).is_ok());
        assert_eq!(
            OTHER_OWNER.authorize_order_management(&ORDER),
            Err(AccessDenied::NotOwner)
        );
    }

    #[test]
    fn test_role_round_trips_through_strings() {
        assert_eq!("owner".parse::<Role>(), Ok(Role::Owner));
        assert_eq!(Role::Customer.to_string(), "customer");
        assert!("admin".parse::<Role>().is_err());
    }
}
