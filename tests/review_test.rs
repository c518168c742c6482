mod common;

use std::sync::Arc;

use async_trait::async_trait;
use common::*;
use nird::{
    domain::{CreateSubmissionRequest, NotificationType, ReviewDecision, SubmissionStatus, UserRole},
    error::AppError,
    notifications::{NotificationChannel, NotificationEvent},
    service::review_service::DEFAULT_REJECTION_FEEDBACK,
};

#[tokio::test]
async fn test_approvals_credit_team_and_rank_it() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;

    let (alpha, alice) = team(&ctx, "Alpha").await?;
    let (beta, bob) = team(&ctx, "Beta").await?;

    for (title, points) in [("Audit", 100), ("Repair", 200), ("Reuse", 300)] {
        let m = mission(&ctx, title, points).await?;
        approve(&ctx, &m, &alice, &teacher).await?;
    }
    let big = mission(&ctx, "Donate", 300).await?;
    approve(&ctx, &big, &bob, &teacher).await?;

    let alpha = ctx.team_repo.find_by_id(alpha.id).await?.unwrap();
    assert_eq!(alpha.total_points, 600);
    assert_eq!(alpha.missions_completed, 3);
    assert_eq!(approved_totals(&ctx, alpha.id).await?, (600, 3));

    let board = ctx.leaderboard_service.calculate(&Default::default()).await?;
    assert_eq!(board.len(), 2);
    assert_eq!(board[0].team_id, alpha.id);
    assert_eq!(board[0].rank, 1);
    assert_eq!(board[0].average_score, 200.0);
    assert_eq!(board[1].team_id, beta.id);
    assert_eq!(board[1].rank, 2);
    assert_eq!(board[1].total_points, 300);

    Ok(())
}

#[tokio::test]
async fn test_second_review_is_invalid_state() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;

    let approved = approve(&ctx, &m, &alice, &teacher).await?;
    assert_eq!(approved.status, SubmissionStatus::Approved);
    assert_eq!(approved.reviewed_by, Some(teacher.id));
    assert!(approved.reviewed_at.is_some());

    for decision in [ReviewDecision::Approved, ReviewDecision::Rejected] {
        let again = ctx.review_service
            .review(approved.id, teacher.id, decision, Some("again".to_string()))
            .await;
        assert!(matches!(again, Err(AppError::InvalidState(_))));
    }

    let alpha = ctx.team_repo.find_by_id(alpha.id).await?.unwrap();
    assert_eq!((alpha.total_points, alpha.missions_completed), (100, 1));

    let stored = ctx.review_service.get(approved.id).await?;
    assert_eq!(stored.status, SubmissionStatus::Approved);
    assert_eq!(stored.review_comment, None);

    Ok(())
}

#[tokio::test]
async fn test_live_submission_blocks_resubmission() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (_alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;

    let first = ctx.review_service.submit(m.id, alice.id, proof()).await?;
    let dup = ctx.review_service.submit(m.id, alice.id, proof()).await;
    assert!(matches!(dup, Err(AppError::InvalidState(_))));

    // A rejected attempt frees the mission for another try.
    ctx.review_service
        .review(first.id, teacher.id, ReviewDecision::Rejected, None)
        .await?;
    let retry = ctx.review_service.submit(m.id, alice.id, proof()).await?;
    assert_eq!(retry.status, SubmissionStatus::Pending);

    ctx.review_service
        .review(retry.id, teacher.id, ReviewDecision::Approved, None)
        .await?;
    let after_approval = ctx.review_service.submit(m.id, alice.id, proof()).await;
    assert!(matches!(after_approval, Err(AppError::InvalidState(_))));

    Ok(())
}

#[tokio::test]
async fn test_rejection_keeps_aggregates_and_sends_feedback() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (alpha, alice) = team(&ctx, "Alpha").await?;
    let audit = mission(&ctx, "Audit", 100).await?;
    let repair = mission(&ctx, "Repair", 200).await?;

    let s1 = ctx.review_service.submit(audit.id, alice.id, proof()).await?;
    let rejected = ctx.review_service
        .review(s1.id, teacher.id, ReviewDecision::Rejected, Some("Needs a photo of the lab".to_string()))
        .await?;
    assert_eq!(rejected.status, SubmissionStatus::Rejected);

    let s2 = ctx.review_service.submit(repair.id, alice.id, proof()).await?;
    ctx.review_service
        .review(s2.id, teacher.id, ReviewDecision::Rejected, None)
        .await?;

    let alpha = ctx.team_repo.find_by_id(alpha.id).await?.unwrap();
    assert_eq!((alpha.total_points, alpha.missions_completed), (0, 0));

    let notifications = ctx.notification_repo.list_for_user(alice.id, false, 10, 0).await?;
    assert_eq!(notifications.len(), 2);
    assert!(notifications
        .iter()
        .all(|n| n.notification_type == NotificationType::MissionRejected));

    let messages: Vec<String> = notifications.iter().filter_map(|n| n.message.clone()).collect();
    assert!(messages.iter().any(|m| m.contains("Needs a photo of the lab")));
    assert!(messages.iter().any(|m| m.contains(DEFAULT_REJECTION_FEEDBACK)));

    Ok(())
}

#[tokio::test]
async fn test_review_requires_reviewer_capability() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let (_alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;
    let s = ctx.review_service.submit(m.id, alice.id, proof()).await?;

    let own = ctx.review_service.review(s.id, alice.id, ReviewDecision::Approved, None).await;
    assert!(matches!(own, Err(AppError::Forbidden(_))));

    let missing = ctx.review_service
        .review(uuid::Uuid::new_v4(), alice.id, ReviewDecision::Approved, None)
        .await;
    assert!(matches!(missing, Err(AppError::Forbidden(_))));

    let admin = user(&ctx, "admin", UserRole::Admin).await?;
    let not_found = ctx.review_service
        .review(uuid::Uuid::new_v4(), admin.id, ReviewDecision::Approved, None)
        .await;
    assert!(matches!(not_found, Err(AppError::NotFound(_))));

    let approved = ctx.review_service.review(s.id, admin.id, ReviewDecision::Approved, None).await?;
    assert_eq!(approved.status, SubmissionStatus::Approved);

    Ok(())
}

#[tokio::test]
async fn test_submission_rules() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let loner = user(&ctx, "loner", UserRole::Student).await?;
    let (_alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 100).await?;

    let no_team = ctx.review_service.submit(m.id, loner.id, proof()).await;
    assert!(matches!(no_team, Err(AppError::NotFound(_))));

    let staff = ctx.review_service.submit(m.id, teacher.id, proof()).await;
    assert!(matches!(staff, Err(AppError::Forbidden(_))));

    let blank = ctx.review_service
        .submit(
            m.id,
            alice.id,
            CreateSubmissionRequest {
                description: Some("   ".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(blank, Err(AppError::Validation(_))));

    ctx.mission_repo.set_active(m.id, false).await?;
    let inactive = ctx.review_service.submit(m.id, alice.id, proof()).await;
    assert!(matches!(inactive, Err(AppError::BadRequest(_))));

    Ok(())
}

struct BrokenChannel;

#[async_trait]
impl NotificationChannel for BrokenChannel {
    fn name(&self) -> &str {
        "broken"
    }

    async fn deliver(&self, _event: &NotificationEvent) -> nird::error::Result<()> {
        Err(AppError::Internal("mail relay unreachable".to_string()))
    }
}

#[tokio::test]
async fn test_failing_channel_does_not_undo_approval() -> anyhow::Result<()> {
    let ctx = setup().await?;
    ctx.dispatcher.register(Arc::new(BrokenChannel)).await;

    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (alpha, alice) = team(&ctx, "Alpha").await?;
    let m = mission(&ctx, "Audit", 150).await?;

    let approved = approve(&ctx, &m, &alice, &teacher).await?;
    assert_eq!(approved.status, SubmissionStatus::Approved);

    let alpha = ctx.team_repo.find_by_id(alpha.id).await?.unwrap();
    assert_eq!(alpha.total_points, 150);

    // The in-app channel still delivered.
    let notifications = ctx.notification_repo.list_for_user(alice.id, false, 50, 0).await?;
    let approval = notifications
        .iter()
        .find(|n| n.notification_type == NotificationType::MissionApproved)
        .expect("approval notification");
    assert!(approval.message.as_deref().unwrap().contains("150 points"));
    assert_eq!(approval.related_id, Some(m.id));

    Ok(())
}

#[tokio::test]
async fn test_aggregates_match_approved_submissions() -> anyhow::Result<()> {
    let ctx = setup().await?;
    let teacher = user(&ctx, "teacher", UserRole::Teacher).await?;
    let (alpha, alice) = team(&ctx, "Alpha").await?;

    let mut submissions = Vec::new();
    for (i, points) in [40, 0, 75, 120, 5].into_iter().enumerate() {
        let m = mission(&ctx, &format!("Mission {}", i), points).await?;
        submissions.push(ctx.review_service.submit(m.id, alice.id, proof()).await?);
    }

    let decisions = [
        ReviewDecision::Approved,
        ReviewDecision::Rejected,
        ReviewDecision::Approved,
        ReviewDecision::Rejected,
        ReviewDecision::Approved,
    ];
    for (submission, decision) in submissions.iter().zip(decisions) {
        ctx.review_service.review(submission.id, teacher.id, decision, None).await?;
        let team = ctx.team_repo.find_by_id(alpha.id).await?.unwrap();
        assert_eq!(
            (team.total_points, team.missions_completed),
            approved_totals(&ctx, alpha.id).await?
        );
    }

    let team = ctx.team_repo.find_by_id(alpha.id).await?.unwrap();
    assert_eq!((team.total_points, team.missions_completed), (120, 3));

    Ok(())
}
