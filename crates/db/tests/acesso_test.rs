//! Access-control storage tests: sessions, CSRF tokens, the login guard and
//! role permissions.

mod common;

use chrono::{Duration, Utc};
use common::{seed_base, setup_db};
use gestor_core::permissions;
use gestor_core::security::{RateLimitPolicy, RateLimitStatus};
use gestor_db::repositories::{
    Ator, ColaboradorRepository, CsrfRepository, RateLimitRepository, RbacRepository,
    RepositoryError, SessionMeta, SessionRepository,
};

#[tokio::test]
async fn test_refresh_rotation_revokes_old_session() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = SessionRepository::new(db.clone());
    let meta = SessionMeta::default();
    let expira = Utc::now() + Duration::days(7);

    repo.create(base.colaborador_id, "token-a", expira, &meta)
        .await
        .unwrap();
    let antiga = repo.find_active_by_token("token-a").await.unwrap().unwrap();

    repo.rotate(&antiga, "token-b", expira, &meta).await.unwrap();
    assert!(repo.find_active_by_token("token-a").await.unwrap().is_none());
    assert!(repo.find_active_by_token("token-b").await.unwrap().is_some());

    assert!(repo.revoke_by_token("token-b").await.unwrap());
    assert!(!repo.revoke_by_token("token-b").await.unwrap());
}

#[tokio::test]
async fn test_expired_session_is_not_active() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = SessionRepository::new(db.clone());

    repo.create(
        base.colaborador_id,
        "velho",
        Utc::now() - Duration::minutes(1),
        &SessionMeta::default(),
    )
    .await
    .unwrap();
    assert!(repo.find_active_by_token("velho").await.unwrap().is_none());
}

#[tokio::test]
async fn test_csrf_token_is_bound_to_colaborador() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = CsrfRepository::new(db.clone());

    let token = repo
        .issue(base.colaborador_id, Duration::hours(1))
        .await
        .unwrap();
    assert!(repo.validate(base.colaborador_id, &token).await.unwrap());
    assert!(!repo.validate(uuid::Uuid::new_v4(), &token).await.unwrap());
    assert!(!repo.validate(base.colaborador_id, "forjado").await.unwrap());

    assert_eq!(repo.revoke_all(base.colaborador_id).await.unwrap(), 1);
    assert!(!repo.validate(base.colaborador_id, &token).await.unwrap());
}

#[tokio::test]
async fn test_login_guard_blocks_at_threshold() {
    let db = setup_db().await;
    let repo = RateLimitRepository::new(db.clone());
    let policy = RateLimitPolicy::from_secs(3, 900, 600);
    let agora = Utc::now();

    for _ in 0..2 {
        let status = repo.registrar(&policy, "ana|1.2.3.4", "login", agora).await.unwrap();
        assert_eq!(status, RateLimitStatus::Liberado);
    }
    let status = repo.registrar(&policy, "ana|1.2.3.4", "login", agora).await.unwrap();
    assert!(matches!(status, RateLimitStatus::Bloqueado { .. }));
    assert!(matches!(
        repo.status(&policy, "ana|1.2.3.4", "login", agora).await.unwrap(),
        RateLimitStatus::Bloqueado { .. }
    ));

    // Other identifiers are unaffected.
    assert_eq!(
        repo.status(&policy, "bia|1.2.3.4", "login", agora).await.unwrap(),
        RateLimitStatus::Liberado
    );

    repo.limpar("ana|1.2.3.4", "login").await.unwrap();
    assert_eq!(
        repo.status(&policy, "ana|1.2.3.4", "login", agora).await.unwrap(),
        RateLimitStatus::Liberado
    );
}

async fn tentativas_de(db: &sea_orm::DatabaseConnection, identificador: &str) -> u64 {
    use gestor_db::entities::rate_limits;
    use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

    rate_limits::Entity::find()
        .filter(rate_limits::Column::Identificador.eq(identificador))
        .count(db)
        .await
        .unwrap()
}

#[tokio::test]
async fn test_attempts_outside_window_are_purged() {
    let db = setup_db().await;
    let repo = RateLimitRepository::new(db.clone());
    let policy = RateLimitPolicy::from_secs(5, 60, 600);
    let inicio = Utc::now() - Duration::minutes(10);

    for _ in 0..3 {
        repo.registrar(&policy, "10.0.0.1", "auth", inicio).await.unwrap();
    }
    repo.registrar(&policy, "10.0.0.2", "auth", inicio).await.unwrap();
    assert_eq!(tentativas_de(&db, "10.0.0.1").await, 3);

    let depois = inicio + Duration::seconds(61);
    let status = repo.registrar(&policy, "10.0.0.1", "auth", depois).await.unwrap();
    assert_eq!(status, RateLimitStatus::Liberado);
    assert_eq!(tentativas_de(&db, "10.0.0.1").await, 1);
    // Purging is per identifier.
    assert_eq!(tentativas_de(&db, "10.0.0.2").await, 1);
}

#[tokio::test]
async fn test_blocked_attempts_survive_purge_until_block_ends() {
    let db = setup_db().await;
    let repo = RateLimitRepository::new(db.clone());
    let policy = RateLimitPolicy::from_secs(2, 60, 600);
    let inicio = Utc::now() - Duration::minutes(30);

    repo.registrar(&policy, "ana|1.2.3.4", "login", inicio).await.unwrap();
    let status = repo.registrar(&policy, "ana|1.2.3.4", "login", inicio).await.unwrap();
    assert!(matches!(status, RateLimitStatus::Bloqueado { .. }));

    // Past the window but inside the block: the blocked rows stay.
    let durante = inicio + Duration::seconds(120);
    repo.registrar(&policy, "ana|1.2.3.4", "login", durante).await.unwrap();
    assert!(tentativas_de(&db, "ana|1.2.3.4").await >= 3);
    assert!(matches!(
        repo.status(&policy, "ana|1.2.3.4", "login", durante).await.unwrap(),
        RateLimitStatus::Bloqueado { .. }
    ));

    // Once the block is over, everything outside the window goes.
    let depois = inicio + Duration::seconds(700);
    repo.registrar(&policy, "ana|1.2.3.4", "login", depois).await.unwrap();
    assert_eq!(tentativas_de(&db, "ana|1.2.3.4").await, 1);
}

#[tokio::test]
async fn test_role_permissions() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = RbacRepository::new(db.clone());
    let ator = base.ator();

    assert_eq!(
        repo.sincronizar_catalogo().await.unwrap(),
        permissions::catalogo().len()
    );
    assert_eq!(repo.sincronizar_catalogo().await.unwrap(), 0);

    let codigos = vec!["vendas.visualizar".to_string(), "vendas.criar".to_string()];
    repo.substituir_permissoes(&ator, base.role_id, &codigos)
        .await
        .unwrap();

    assert!(repo.role_tem_permissao(base.role_id, "vendas.criar").await.unwrap());
    assert!(!repo.role_tem_permissao(base.role_id, "vendas.cancelar").await.unwrap());

    let err = repo
        .substituir_permissoes(&ator, base.role_id, &["nao.existe".to_string()])
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Validation(_)));
}

#[tokio::test]
async fn test_role_in_use_cannot_be_deleted() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = RbacRepository::new(db.clone());

    assert!(matches!(
        repo.delete_role(&Ator::sistema(), base.role_id).await,
        Err(RepositoryError::InUse(_))
    ));
    assert!(matches!(
        repo.delete_nivel(&Ator::sistema(), base.nivel_id).await,
        Err(RepositoryError::InUse(_))
    ));
}

#[tokio::test]
async fn test_password_change_keeps_hash_private() {
    let db = setup_db().await;
    let base = seed_base(&db).await;
    let repo = ColaboradorRepository::new(db.clone());

    let antes = repo.find(base.colaborador_id, false).await.unwrap();
    repo.alterar_senha(&base.ator(), base.colaborador_id, "novaSenha99")
        .await
        .unwrap();
    let depois = repo.find(base.colaborador_id, false).await.unwrap();
    assert_ne!(antes.senha_hash, depois.senha_hash);
    assert!(
        gestor_core::auth::verify_password("novaSenha99", &depois.senha_hash).unwrap()
    );

    let json = serde_json::to_value(&depois).unwrap();
    assert!(json.get("senha_hash").is_none());
}
