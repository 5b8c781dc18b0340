use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CompanyStore, StoreError, StoreResult, UserStore};
use crate::models::{Company, CompanyCounts, NewCompany, ProfileChanges, UserProfile};

/// Store em memória com as mesmas restrições de unicidade do schema SQL
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    companies: Arc<RwLock<HashMap<Uuid, Company>>>,
    users: Arc<RwLock<HashMap<Uuid, UserProfile>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CompanyStore for MemoryStore {
    async fn list(&self, active_only: bool) -> StoreResult<Vec<Company>> {
        let companies = self.companies.read().await;
        let mut list: Vec<Company> = companies
            .values()
            .filter(|c| !active_only || c.active)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.companies.read().await.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> StoreResult<Option<Company>> {
        let companies = self.companies.read().await;
        Ok(companies.values().find(|c| c.name == name).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> StoreResult<Option<Company>> {
        let companies = self.companies.read().await;
        Ok(companies.values().find(|c| c.slug == slug).cloned())
    }

    async fn slug_exists(&self, slug: &str) -> StoreResult<bool> {
        let companies = self.companies.read().await;
        Ok(companies.values().any(|c| c.slug == slug))
    }

    async fn insert(&self, company: NewCompany) -> StoreResult<Company> {
        let mut companies = self.companies.write().await;

        if companies.values().any(|c| c.name == company.name) {
            return Err(StoreError::UniqueViolation(format!("companies.name = {}", company.name)));
        }
        if companies.values().any(|c| c.slug == company.slug) {
            return Err(StoreError::UniqueViolation(format!("companies.slug = {}", company.slug)));
        }

        let now = Utc::now();
        let created = Company {
            id: Uuid::new_v4(),
            name: company.name,
            display_name: company.display_name,
            slug: company.slug,
            active: true,
            created_at: now,
            updated_at: now,
        };
        companies.insert(created.id, created.clone());
        Ok(created)
    }

    async fn reactivate(&self, id: Uuid, display_name: &str) -> StoreResult<Company> {
        let mut companies = self.companies.write().await;
        let company = companies
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("company {}", id)))?;

        company.active = true;
        company.display_name = display_name.to_string();
        company.updated_at = Utc::now();
        Ok(company.clone())
    }

    async fn deactivate_all(&self) -> StoreResult<u64> {
        let mut companies = self.companies.write().await;
        let now = Utc::now();
        let mut changed = 0;
        for company in companies.values_mut().filter(|c| c.active) {
            company.active = false;
            company.updated_at = now;
            changed += 1;
        }
        Ok(changed)
    }

    async fn count_by_status(&self) -> StoreResult<CompanyCounts> {
        let companies = self.companies.read().await;
        let active = companies.values().filter(|c| c.active).count() as u64;
        let total = companies.len() as u64;
        Ok(CompanyCounts {
            total,
            active,
            inactive: total - active,
        })
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn list_users(&self) -> StoreResult<Vec<UserProfile>> {
        let users = self.users.read().await;
        let mut list: Vec<UserProfile> = users.values().cloned().collect();
        list.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(list)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<UserProfile>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<UserProfile>> {
        let wanted = email.trim().to_lowercase();
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.to_lowercase() == wanted)
            .cloned())
    }

    async fn insert_user(&self, profile: UserProfile) -> StoreResult<UserProfile> {
        let mut users = self.users.write().await;
        let email = profile.email.to_lowercase();

        if users.contains_key(&profile.id) {
            return Err(StoreError::UniqueViolation(format!("user_profiles.id = {}", profile.id)));
        }
        if users.values().any(|u| u.email.to_lowercase() == email) {
            return Err(StoreError::UniqueViolation(format!("user_profiles.email = {}", email)));
        }

        users.insert(profile.id, profile.clone());
        Ok(profile)
    }

    async fn update_user(&self, id: Uuid, changes: ProfileChanges) -> StoreResult<UserProfile> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;

        if let Some(full_name) = changes.full_name {
            user.full_name = full_name;
        }
        if let Some(role) = changes.role {
            user.role = role;
        }
        if let Some(company_id) = changes.company_id {
            user.company_id = company_id;
        }
        if let Some(active) = changes.active {
            user.active = active;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn set_user_active(&self, id: Uuid, active: bool) -> StoreResult<()> {
        let mut users = self.users.write().await;
        let user = users
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))?;
        user.active = active;
        user.updated_at = Utc::now();
        Ok(())
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        self.users
            .write()
            .await
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(format!("user {}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    fn new_company(name: &str, slug: &str) -> NewCompany {
        NewCompany {
            name: name.into(),
            display_name: name.into(),
            slug: slug.into(),
        }
    }

    fn profile(email: &str, company_id: Uuid) -> UserProfile {
        let now = Utc::now();
        UserProfile {
            id: Uuid::new_v4(),
            email: email.into(),
            full_name: "Teste".into(),
            role: Role::Viewer,
            active: true,
            company_id,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_company_uniqueness() {
        let store = MemoryStore::new();
        store.insert(new_company("WCB", "wcb")).await.unwrap();

        assert!(matches!(
            store.insert(new_company("WCB", "wcb-2")).await,
            Err(StoreError::UniqueViolation(_))
        ));
        assert!(matches!(
            store.insert(new_company("W.C.B", "wcb")).await,
            Err(StoreError::UniqueViolation(_))
        ));
        assert!(store.slug_exists("wcb").await.unwrap());
    }

    #[tokio::test]
    async fn test_deactivate_all_and_counts() {
        let store = MemoryStore::new();
        let wcb = store.insert(new_company("WCB", "wcb")).await.unwrap();
        store.insert(new_company("AMZ", "amz")).await.unwrap();

        assert_eq!(store.deactivate_all().await.unwrap(), 2);
        assert_eq!(store.deactivate_all().await.unwrap(), 0);

        store.reactivate(wcb.id, "WCB Logística").await.unwrap();
        let counts = store.count_by_status().await.unwrap();
        assert_eq!(counts, CompanyCounts { total: 2, active: 1, inactive: 1 });
        assert_eq!(store.list(true).await.unwrap()[0].display_name, "WCB Logística");
    }

    #[tokio::test]
    async fn test_user_email_is_case_insensitive() {
        let store = MemoryStore::new();
        let company = Uuid::new_v4();
        store.insert_user(profile("Ana@Empresa.com", company)).await.unwrap();

        assert!(store.find_user_by_email("ana@empresa.COM").await.unwrap().is_some());
        assert!(matches!(
            store.insert_user(profile("ANA@empresa.com", company)).await,
            Err(StoreError::UniqueViolation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_and_delete_user() {
        let store = MemoryStore::new();
        let user = store.insert_user(profile("a@b.com", Uuid::new_v4())).await.unwrap();

        let updated = store
            .update_user(
                user.id,
                ProfileChanges {
                    role: Some(Role::Manager),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role, Role::Manager);
        assert_eq!(updated.full_name, "Teste");

        store.set_user_active(user.id, false).await.unwrap();
        assert!(!store.find_user(user.id).await.unwrap().unwrap().active);

        store.delete_user(user.id).await.unwrap();
        assert!(matches!(store.delete_user(user.id).await, Err(StoreError::NotFound(_))));
    }
}
