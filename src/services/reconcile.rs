//! Matches an asynchronous payment notification to its originating
//! registration and issues the invoice/receipt document, at most once per
//! registration id.

use {
    crate::{
        AppState,
        adapters::{
            pelecard,
            sumit::{CustomerRecord, DocumentRequest},
        },
        domain::{
            money::Amount,
            normalize,
            payment::PaymentDetails,
            registration::{RegId, RegistrationContext},
        },
    },
    chrono::Utc,
    rust_decimal::Decimal,
};

/// Terminal result of handling one payment notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Notification was malformed or incomplete. Acknowledged and dropped,
    /// since surfacing an error would only make the gateway re-deliver
    /// garbage.
    Ignored(&'static str),
    /// Gateway reported a non-success code. No document, no scratch
    /// mutation.
    Declined { code: String },
    /// This registration already has its amount/receipt pair; a re-delivered
    /// notification is a no-op.
    Duplicate,
    /// Document issued and scratch record updated.
    Reconciled {
        document_id: String,
        receipt_url: String,
    },
    /// Payment approved at the gateway but no document could be issued:
    /// money moved with no receipt. Recorded on the scratch record and in
    /// the log.
    Failed { reason: String },
}

pub async fn reconcile(state: &AppState, raw_body: &str) -> ReconcileOutcome {
    // Whatever shape the notification arrived in, get at the fields.
    let Some(notification) = pelecard::parse_notification(raw_body) else {
        tracing::warn!("unparseable payment notification");
        return ReconcileOutcome::Ignored("unparseable notification");
    };
    let pushed = pelecard::details(&notification).clone();

    let Some(transaction_id) = pelecard::extract_transaction_id(&pushed) else {
        tracing::warn!("notification carries no transaction id");
        return ReconcileOutcome::Ignored("missing transaction id");
    };
    let Some(reg_id) = pelecard::extract_reg_id(&pushed) else {
        tracing::warn!(transaction_id = %transaction_id, "notification carries no registration id");
        return ReconcileOutcome::Ignored("missing registration id");
    };

    // The follow-up lookup is authoritative over the initial push.
    let details = match state.gateway.fetch_transaction(&transaction_id).await {
        Some(fetched) => fetched,
        None => pushed,
    };

    if !pelecard::is_approved(&details) {
        let code = pelecard::status_code(&details);
        tracing::info!(
            reg_id = %reg_id,
            transaction_id = %transaction_id,
            code = %code,
            "payment not approved, no document issued"
        );
        return ReconcileOutcome::Declined { code };
    }

    let minor = normalize::amount_minor_units(&details);

    // Customer display fields saved when the session was opened.
    let mut record = state.store.get(&reg_id).await;

    // At most one amount/receipt pair is ever written per registration.
    if record.is_reconciled() {
        let incoming = Decimal::new(minor, 2);
        if record.paid_amount.is_some_and(|stored| stored != incoming) {
            tracing::warn!(
                reg_id = %reg_id,
                stored = ?record.paid_amount,
                incoming = %incoming,
                "re-delivered notification disagrees on amount, keeping the stored pair"
            );
        } else {
            tracing::info!(reg_id = %reg_id, "notification re-delivered, already reconciled");
        }
        return ReconcileOutcome::Duplicate;
    }

    let amount = match Amount::from_minor(minor) {
        Ok(amount) => amount,
        Err(_) => {
            tracing::error!(
                reg_id = %reg_id,
                transaction_id = %transaction_id,
                minor,
                "approved payment carries no usable amount"
            );
            return fail(state, &reg_id, record, "amount invalid".to_string()).await;
        }
    };
    let installments = normalize::payment_count_from(&details);
    let last4 = pelecard::extract_last4(&details).unwrap_or_default();

    let customer = CustomerRecord {
        external_id: reg_id.as_str().to_string(),
        person_id: None,
        name: record
            .customer_name
            .clone()
            .unwrap_or_else(|| "Client".to_string()),
        phone: record.customer_phone.clone(),
        email: record.customer_email.clone(),
        city: record.customer_city.clone(),
        address: record.customer_address.clone(),
    };

    let upsert = state.accounting.upsert_customer(&customer).await;
    tracing::debug!(reg_id = %reg_id, ?upsert, "customer upsert");

    let request = DocumentRequest {
        customer,
        sku: state.config.item_sku.clone(),
        description: state.config.item_description.clone(),
        amount,
        payment: PaymentDetails::CreditCard {
            last4,
            installments,
        },
    };

    match state.accounting.create_document(&request).await {
        Ok(result) => {
            record.reg_id.get_or_insert_with(|| reg_id.as_str().to_string());
            record.paid_amount = Some(amount.major());
            record.receipt_url = Some(result.receipt_url.clone());
            record.reconciled_at = Some(Utc::now());
            record.last_error = None;
            state.store.put(&reg_id, &record).await;
            tracing::info!(
                reg_id = %reg_id,
                transaction_id = %transaction_id,
                document_id = %result.document_id,
                amount = %amount,
                "payment reconciled"
            );
            ReconcileOutcome::Reconciled {
                document_id: result.document_id,
                receipt_url: result.receipt_url,
            }
        }
        Err(e) => {
            tracing::error!(
                reg_id = %reg_id,
                transaction_id = %transaction_id,
                error = %e,
                "payment approved but document creation failed"
            );
            fail(state, &reg_id, record, e.user_message()).await
        }
    }
}

async fn fail(
    state: &AppState,
    reg_id: &RegId,
    mut record: RegistrationContext,
    reason: String,
) -> ReconcileOutcome {
    record.reg_id.get_or_insert_with(|| reg_id.as_str().to_string());
    record.last_error = Some(reason.clone());
    state.store.put(reg_id, &record).await;
    ReconcileOutcome::Failed { reason }
}
