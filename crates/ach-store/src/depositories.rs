//! Repository for [`Depository`] rows, including the return-file lookup
//! by `(routing number, hashed account number)` that never touches
//! cleartext.

use crate::codec::{decode, encode};
use crate::error::{Result, StoreError};
use ach_types::{Depository, DepositoryId, RoutingNumber};

#[derive(Clone)]
pub struct DepositoryRepo {
    by_id: sled::Tree,
}

impl DepositoryRepo {
    pub fn open(db: &sled::Db) -> Result<Self> {
        Ok(Self { by_id: db.open_tree("depositories")? })
    }

    pub fn upsert(&self, depository: &Depository) -> Result<()> {
        self.by_id.insert(depository.id.as_uuid().as_bytes(), encode(depository)?)?;
        Ok(())
    }

    /// Visible to every caller except the admin-level `get_admin`:
    /// soft-deleted rows are invisible outside the admin surface.
    pub fn get(&self, id: DepositoryId) -> Result<Option<Depository>> {
        let found = self.get_admin(id)?;
        Ok(found.filter(|d| !d.is_deleted()))
    }

    pub fn get_admin(&self, id: DepositoryId) -> Result<Option<Depository>> {
        match self.by_id.get(id.as_uuid().as_bytes())? {
            Some(bytes) => Ok(Some(decode(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Full scan keyed on routing number and hashed account number —
    /// acceptable at the embedded-store scale this crate targets; a
    /// relational backing store would index this pair.
    pub fn lookup_from_return(&self, routing_number: RoutingNumber, hashed_account_number: &[u8; 32]) -> Result<Option<Depository>> {
        for item in self.by_id.iter() {
            let (_, bytes) = item?;
            let depository: Depository = decode(&bytes)?;
            if depository.is_deleted() {
                continue;
            }
            if depository.routing_number == routing_number && &depository.hashed_account_number == hashed_account_number {
                return Ok(Some(depository));
            }
        }
        Ok(None)
    }

    /// Applies a notification-of-change account-number correction. The
    /// processor never holds the encryption key the original cleartext was
    /// sealed under, so it can only refresh the lookup hash, not the stored
    /// ciphertext; status reverts to unverified, matching
    /// [`Depository::set_account_number`]'s own rule that an account-number
    /// change always requires re-verification.
    pub fn update_hashed_account_number(&self, id: DepositoryId, hashed: [u8; 32], now: chrono::DateTime<chrono::Utc>) -> Result<Depository> {
        let mut depository = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        depository.hashed_account_number = hashed;
        depository.status = ach_types::DepositoryStatus::Unverified;
        depository.updated_at = now;
        self.upsert(&depository)?;
        Ok(depository)
    }

    /// Applies a notification-of-change routing-number correction. Does not
    /// recompute `hashed_account_number` — doing so would need the cleartext
    /// account number, which this repository never holds — so a routing-only
    /// correction leaves future return lookups keyed on the old routing
    /// number until the account is re-verified.
    pub fn update_routing_number(&self, id: DepositoryId, routing_number: RoutingNumber, now: chrono::DateTime<chrono::Utc>) -> Result<Depository> {
        let mut depository = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        depository.routing_number = routing_number;
        depository.status = ach_types::DepositoryStatus::Unverified;
        depository.updated_at = now;
        self.upsert(&depository)?;
        Ok(depository)
    }

    pub fn reject(&self, id: DepositoryId) -> Result<Depository> {
        let mut depository = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        depository.status = depository.status.reject();
        self.upsert(&depository)?;
        Ok(depository)
    }

    pub fn verify(&self, id: DepositoryId) -> Result<Depository> {
        let mut depository = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        depository.status = depository.status.verify()?;
        self.upsert(&depository)?;
        Ok(depository)
    }

    /// Administrative status override. Does not cascade to outstanding
    /// transfers against this depository (see DESIGN.md).
    pub fn admin_override(&self, id: DepositoryId, to: ach_types::DepositoryStatus) -> Result<Depository> {
        let mut depository = self.get_admin(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        depository.status = ach_types::DepositoryStatus::admin_override(depository.status, to);
        self.upsert(&depository)?;
        Ok(depository)
    }

    pub fn soft_delete(&self, id: DepositoryId, at: chrono::DateTime<chrono::Utc>) -> Result<()> {
        let mut depository = self.get(id)?.ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        depository.deleted_at = Some(at);
        depository.updated_at = at;
        self.upsert(&depository)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ach_codec::hash_account_number;
    use ach_types::{AccountType, DepositoryStatus, HolderType, UserId};
    use chrono::Utc;

    fn sample(routing: RoutingNumber, hashed: [u8; 32]) -> Depository {
        Depository {
            id: DepositoryId::new(),
            user_id: UserId::new(),
            bank_name: "First Bank".to_string(),
            holder_name: "Jane Doe".to_string(),
            holder_type: HolderType::Individual,
            account_type: AccountType::Checking,
            routing_number: routing,
            encrypted_account_number: vec![0xde, 0xad],
            hashed_account_number: hashed,
            status: DepositoryStatus::Unverified,
            metadata: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }

    #[test]
    fn lookup_from_return_roundtrips() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let repo = DepositoryRepo::open(&db).unwrap();
        let routing = RoutingNumber::parse("091400606").unwrap();
        let hashed = hash_account_number(&routing, "123456789");
        let depository = sample(routing, hashed);
        repo.upsert(&depository).unwrap();

        let found = repo.lookup_from_return(routing, &hashed).unwrap().unwrap();
        assert_eq!(found.id, depository.id);
    }

    #[test]
    fn lookup_misses_on_wrong_hash() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let repo = DepositoryRepo::open(&db).unwrap();
        let routing = RoutingNumber::parse("091400606").unwrap();
        let hashed = hash_account_number(&routing, "123456789");
        repo.upsert(&sample(routing, hashed)).unwrap();

        let other_hash = hash_account_number(&routing, "999999999");
        assert!(repo.lookup_from_return(routing, &other_hash).unwrap().is_none());
    }

    #[test]
    fn soft_deleted_rows_are_invisible_except_to_admin() {
        let db = sled::Config::new().temporary(true).open().unwrap();
        let repo = DepositoryRepo::open(&db).unwrap();
        let routing = RoutingNumber::parse("091400606").unwrap();
        let depository = sample(routing, [0u8; 32]);
        let id = depository.id;
        repo.upsert(&depository).unwrap();
        repo.soft_delete(id, Utc::now()).unwrap();

        assert!(repo.get(id).unwrap().is_none());
        assert!(repo.get_admin(id).unwrap().is_some());
    }
}
