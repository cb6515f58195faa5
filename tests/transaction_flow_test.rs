mod common;

use std::sync::{atomic::Ordering, Arc};

use crowdfund::{domain::TransactionStatus, error::AppError};

#[tokio::test]
async fn test_paid_notification_credits_campaign_once() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let ctx = common::context(pool, Default::default());
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;

    let transaction = ctx.transaction_service
        .create_transaction(&backer, campaign.id, 50_000)
        .await?;
    assert_eq!(transaction.status, TransactionStatus::Pending);
    assert_eq!(transaction.payment_url, format!("https://pay.example.test/snap/{}", transaction.code));

    let notice = common::notification(&transaction.code, "capture", Some("accept"));
    let paid = ctx.transaction_service.handle_notification(notice.clone()).await?;
    assert_eq!(paid.status, TransactionStatus::Paid);

    let credited = ctx.campaign_service.get_campaign(campaign.id).await?;
    assert_eq!(credited.current_amount, 50_000);
    assert_eq!(credited.backer_count, 1);

    // Redelivery is a no-op.
    for _ in 0..3 {
        let again = ctx.transaction_service.handle_notification(notice.clone()).await?;
        assert_eq!(again.status, TransactionStatus::Paid);
    }

    let after = ctx.campaign_service.get_campaign(campaign.id).await?;
    assert_eq!(after.current_amount, 50_000);
    assert_eq!(after.backer_count, 1);

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_notifications_apply_once() -> anyhow::Result<()> {
    let db = common::FileDb::new(8).await?;
    let ctx = Arc::new(common::context(db.pool.clone(), Default::default()));
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;

    let transaction = ctx.transaction_service
        .create_transaction(&backer, campaign.id, 25_000)
        .await?;

    // Released together so the deliveries race on separate connections.
    let barrier = Arc::new(tokio::sync::Barrier::new(16));
    let mut handles = Vec::new();
    for _ in 0..16 {
        let ctx = ctx.clone();
        let barrier = barrier.clone();
        let notice = common::notification(&transaction.code, "settlement", None);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            ctx.transaction_service.handle_notification(notice).await
        }));
    }
    for handle in handles {
        let settled = handle.await??;
        assert_eq!(settled.status, TransactionStatus::Paid);
    }

    let credited = ctx.campaign_service.get_campaign(campaign.id).await?;
    assert_eq!(credited.current_amount, 25_000);
    assert_eq!(credited.backer_count, 1);

    Ok(())
}

#[tokio::test]
async fn test_cancelled_transactions_stay_cancelled() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let ctx = common::context(pool, Default::default());
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;

    let transaction = ctx.transaction_service
        .create_transaction(&backer, campaign.id, 10_000)
        .await?;

    let expired = ctx.transaction_service
        .handle_notification(common::notification(&transaction.code, "expire", None))
        .await?;
    assert_eq!(expired.status, TransactionStatus::Cancelled);

    // A late settlement cannot revive a terminal transaction.
    let late = ctx.transaction_service
        .handle_notification(common::notification(&transaction.code, "settlement", None))
        .await?;
    assert_eq!(late.status, TransactionStatus::Cancelled);

    let untouched = ctx.campaign_service.get_campaign(campaign.id).await?;
    assert_eq!(untouched.current_amount, 0);
    assert_eq!(untouched.backer_count, 0);

    Ok(())
}

#[tokio::test]
async fn test_unsettled_statuses_leave_transaction_pending() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let ctx = common::context(pool, Default::default());
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;

    let transaction = ctx.transaction_service
        .create_transaction(&backer, campaign.id, 10_000)
        .await?;

    for (status, fraud) in [("pending", None), ("capture", Some("challenge"))] {
        let result = ctx.transaction_service
            .handle_notification(common::notification(&transaction.code, status, fraud))
            .await?;
        assert_eq!(result.status, TransactionStatus::Pending);
    }

    Ok(())
}

#[tokio::test]
async fn test_unknown_campaign_is_not_found_and_persists_nothing() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let gateway = Arc::new(common::StubGateway::default());
    let ctx = common::context(pool.clone(), gateway.clone());
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;

    let err = ctx.transaction_service
        .create_transaction(&backer, uuid::Uuid::new_v4(), 50_000)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(common::count_transactions(&pool).await?, 0);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);

    Ok(())
}

#[tokio::test]
async fn test_gateway_failure_persists_nothing() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let ctx = common::context(pool.clone(), Arc::new(common::StubGateway::failing()));
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;

    let err = ctx.transaction_service
        .create_transaction(&backer, campaign.id, 50_000)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::PaymentGateway(_)));
    assert_eq!(common::count_transactions(&pool).await?, 0);

    Ok(())
}

#[tokio::test]
async fn test_non_positive_amount_is_rejected() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let ctx = common::context(pool, Default::default());
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;

    let err = ctx.transaction_service
        .create_transaction(&owner, campaign.id, 0)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));

    Ok(())
}

#[tokio::test]
async fn test_forged_notification_is_rejected() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let ctx = common::context(pool, Default::default());
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;

    let transaction = ctx.transaction_service
        .create_transaction(&backer, campaign.id, 50_000)
        .await?;

    let mut forged = common::notification(&transaction.code, "settlement", None);
    forged.signature_key = "made-up".to_string();

    let err = ctx.transaction_service.handle_notification(forged).await.unwrap_err();
    assert!(matches!(err, AppError::Unauthorized));

    let untouched = ctx.campaign_service.get_campaign(campaign.id).await?;
    assert_eq!(untouched.current_amount, 0);

    let unknown = ctx.transaction_service
        .handle_notification(common::notification("TRX-DOES-NOT-EXIST", "settlement", None))
        .await;
    assert!(matches!(unknown, Err(AppError::NotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_transaction_listings() -> anyhow::Result<()> {
    let pool = common::test_pool().await?;
    let ctx = common::context(pool, Default::default());
    let (owner, _) = common::register(&ctx, "Owner", "owner@example.com").await?;
    let (backer, _) = common::register(&ctx, "Backer", "backer@example.com").await?;
    let campaign = common::create_campaign(&ctx, &owner, "Clean Water", 1_000_000).await?;
    ctx.campaign_service.save_campaign_image(campaign.id, owner.id, "images/water.png", true).await?;

    let first = ctx.transaction_service.create_transaction(&backer, campaign.id, 1_000).await?;
    let second = ctx.transaction_service.create_transaction(&backer, campaign.id, 2_000).await?;

    let for_campaign = ctx.transaction_service
        .list_campaign_transactions(campaign.id, owner.id)
        .await?;
    let ids: Vec<_> = for_campaign.iter().map(|t| t.transaction.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert!(for_campaign.iter().all(|t| t.backer_name == "Backer"));

    let forbidden = ctx.transaction_service
        .list_campaign_transactions(campaign.id, backer.id)
        .await;
    assert!(matches!(forbidden, Err(AppError::Forbidden)));

    let for_user = ctx.transaction_service.list_user_transactions(backer.id).await?;
    let ids: Vec<_> = for_user.iter().map(|t| t.transaction.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);
    assert_eq!(for_user[0].campaign_name, "Clean Water");
    assert_eq!(for_user[0].campaign_image.as_deref(), Some("images/water.png"));

    assert!(ctx.transaction_service.list_user_transactions(owner.id).await?.is_empty());

    Ok(())
}
