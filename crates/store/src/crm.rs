//! Repositories for CRM entities: contacts, companies, pipeline stages,
//! opportunities and tasks.

use crate::Store;
use respondo_core::crm::{
    Company, Contact, Opportunity, OpportunityStatus, PipelineStage, Task,
};
use respondo_core::error::StoreError;
use chrono::{DateTime, Utc};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

fn map_err(query: &str) -> impl Fn(sqlx::Error) -> StoreError + '_ {
    move |e| StoreError::QueryFailed(format!("{query}: {e}"))
}

fn contact_from_row(row: &SqliteRow) -> Result<Contact, sqlx::Error> {
    Ok(Contact {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        phone: row.try_get("phone")?,
        company_id: row.try_get("company_id")?,
        lifecycle_stage: row.try_get("lifecycle_stage")?,
    })
}

fn opportunity_from_row(row: &SqliteRow) -> Result<Opportunity, sqlx::Error> {
    let status: String = row.try_get("status")?;
    Ok(Opportunity {
        id: row.try_get("id")?,
        tenant_id: row.try_get("tenant_id")?,
        contact_id: row.try_get("contact_id")?,
        title: row.try_get("title")?,
        amount_cents: row.try_get("amount_cents")?,
        stage_id: row.try_get("stage_id")?,
        status: match status.as_str() {
            "won" => OpportunityStatus::Won,
            "lost" => OpportunityStatus::Lost,
            _ => OpportunityStatus::Open,
        },
    })
}

impl Store {
    pub async fn insert_contact(&self, contact: &Contact) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO contacts (id, tenant_id, name, email, phone, company_id, lifecycle_stage)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&contact.id)
        .bind(&contact.tenant_id)
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company_id)
        .bind(&contact.lifecycle_stage)
        .execute(self.pool())
        .await
        .map_err(map_err("insert_contact"))?;
        Ok(())
    }

    pub async fn get_contact(&self, contact_id: &str) -> Result<Contact, StoreError> {
        let row = sqlx::query("SELECT * FROM contacts WHERE id = ?")
            .bind(contact_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_err("get_contact"))?
            .ok_or_else(|| StoreError::NotFound {
                entity: "contact",
                id: contact_id.to_string(),
            })?;
        contact_from_row(&row).map_err(map_err("get_contact"))
    }

    /// Full-row update of a contact.
    pub async fn update_contact(&self, contact: &Contact) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE contacts SET name = ?, email = ?, phone = ?, company_id = ?,
                                 lifecycle_stage = ?
             WHERE id = ?",
        )
        .bind(&contact.name)
        .bind(&contact.email)
        .bind(&contact.phone)
        .bind(&contact.company_id)
        .bind(&contact.lifecycle_stage)
        .bind(&contact.id)
        .execute(self.pool())
        .await
        .map_err(map_err("update_contact"))?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound {
                entity: "contact",
                id: contact.id.clone(),
            });
        }
        Ok(())
    }

    pub async fn insert_company(&self, company: &Company) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO companies (id, tenant_id, name, industry, website)
             VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&company.id)
        .bind(&company.tenant_id)
        .bind(&company.name)
        .bind(&company.industry)
        .bind(&company.website)
        .execute(self.pool())
        .await
        .map_err(map_err("insert_company"))?;
        Ok(())
    }

    pub async fn get_company(&self, company_id: &str) -> Result<Option<Company>, StoreError> {
        let row = sqlx::query("SELECT * FROM companies WHERE id = ?")
            .bind(company_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_err("get_company"))?;
        row.map(|r| {
            Ok(Company {
                id: r.try_get("id")?,
                tenant_id: r.try_get("tenant_id")?,
                name: r.try_get("name")?,
                industry: r.try_get("industry")?,
                website: r.try_get("website")?,
            })
        })
        .transpose()
        .map_err(map_err("get_company"))
    }

    pub async fn insert_pipeline_stage(&self, stage: &PipelineStage) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO pipeline_stages (id, tenant_id, name, position) VALUES (?, ?, ?, ?)",
        )
        .bind(&stage.id)
        .bind(&stage.tenant_id)
        .bind(&stage.name)
        .bind(stage.position)
        .execute(self.pool())
        .await
        .map_err(map_err("insert_pipeline_stage"))?;
        Ok(())
    }

    /// Pipeline stages for a tenant, ordered by position ascending.
    pub async fn stages_for_tenant(&self, tenant_id: &str) -> Result<Vec<PipelineStage>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM pipeline_stages WHERE tenant_id = ? ORDER BY position ASC",
        )
        .bind(tenant_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_err("stages_for_tenant"))?;

        rows.iter()
            .map(|r| {
                Ok(PipelineStage {
                    id: r.try_get("id")?,
                    tenant_id: r.try_get("tenant_id")?,
                    name: r.try_get("name")?,
                    position: r.try_get("position")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_err("stages_for_tenant"))
    }

    pub async fn insert_opportunity(&self, opp: &Opportunity) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO opportunities (id, tenant_id, contact_id, title, amount_cents, stage_id, status)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&opp.id)
        .bind(&opp.tenant_id)
        .bind(&opp.contact_id)
        .bind(&opp.title)
        .bind(opp.amount_cents)
        .bind(&opp.stage_id)
        .bind(opp.status.to_string())
        .execute(self.pool())
        .await
        .map_err(map_err("insert_opportunity"))?;
        Ok(())
    }

    pub async fn get_opportunity(&self, opp_id: &str) -> Result<Opportunity, StoreError> {
        let row = sqlx::query("SELECT * FROM opportunities WHERE id = ?")
            .bind(opp_id)
            .fetch_optional(self.pool())
            .await
            .map_err(map_err("get_opportunity"))?
            .ok_or_else(|| StoreError::NotFound {
                entity: "opportunity",
                id: opp_id.to_string(),
            })?;
        opportunity_from_row(&row).map_err(map_err("get_opportunity"))
    }

    pub async fn open_opportunities_by_contact(
        &self,
        contact_id: &str,
    ) -> Result<Vec<Opportunity>, StoreError> {
        let rows = sqlx::query(
            "SELECT * FROM opportunities WHERE contact_id = ? AND status = 'open'",
        )
        .bind(contact_id)
        .fetch_all(self.pool())
        .await
        .map_err(map_err("open_opportunities_by_contact"))?;

        rows.iter()
            .map(opportunity_from_row)
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_err("open_opportunities_by_contact"))
    }

    pub async fn update_opportunity_amount(
        &self,
        opp_id: &str,
        amount_cents: i64,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE opportunities SET amount_cents = ? WHERE id = ?")
            .bind(amount_cents)
            .bind(opp_id)
            .execute(self.pool())
            .await
            .map_err(map_err("update_opportunity_amount"))?;
        Ok(())
    }

    pub async fn insert_task(&self, task: &Task) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tasks (id, tenant_id, contact_id, title, description, due_at, done)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(&task.id)
        .bind(&task.tenant_id)
        .bind(&task.contact_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_at.map(|d| d.to_rfc3339()))
        .bind(task.done)
        .execute(self.pool())
        .await
        .map_err(map_err("insert_task"))?;
        Ok(())
    }

    pub async fn tasks_for_contact(&self, contact_id: &str) -> Result<Vec<Task>, StoreError> {
        let rows = sqlx::query("SELECT * FROM tasks WHERE contact_id = ?")
            .bind(contact_id)
            .fetch_all(self.pool())
            .await
            .map_err(map_err("tasks_for_contact"))?;

        rows.iter()
            .map(|r| {
                let due_at: Option<String> = r.try_get("due_at")?;
                Ok(Task {
                    id: r.try_get("id")?,
                    tenant_id: r.try_get("tenant_id")?,
                    contact_id: r.try_get("contact_id")?,
                    title: r.try_get("title")?,
                    description: r.try_get("description")?,
                    due_at: due_at.and_then(|s| {
                        DateTime::parse_from_rfc3339(&s)
                            .ok()
                            .map(|d| d.with_timezone(&Utc))
                    }),
                    done: r.try_get("done")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(map_err("tasks_for_contact"))
    }
}
