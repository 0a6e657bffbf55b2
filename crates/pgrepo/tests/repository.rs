//! Repository round trips against a live database.
//!
//! Every test creates its own table and is skipped when `DATABASE_URL` is not set.

#![cfg(all(feature = "pool", feature = "derive"))]

use pgrepo::{
    ConditionMap, ConditionMapSet, Direction, Fetched, FromRow, GenericClient, Op, PoolConfig,
    Projection, RepoError, RepoResult, Repository, Table, Value,
};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, FromRow)]
struct Account {
    id: i64,
    email: String,
    status: String,
    balance: i64,
    created_at: chrono::DateTime<chrono::Utc>,
}

/// Created as a TEMP table, so each session sees its own copy.
#[derive(Debug, FromRow, Table)]
#[repo(table = "pgrepo_users")]
struct User {
    #[repo(summary)]
    id: i64,
    #[repo(summary, column = "email")]
    address: String,
    password: String,
}

type Pool = deadpool_postgres::Pool;

fn database_url(test: &str) -> Option<String> {
    dotenvy::dotenv().ok();
    match std::env::var("DATABASE_URL") {
        Ok(v) => Some(v),
        Err(_) => {
            eprintln!("DATABASE_URL is not set; skipping {test}");
            None
        }
    }
}

/// Connect and create a fresh accounts table, or `None` when no database is configured.
async fn setup(test: &str) -> RepoResult<Option<(Repository<Account, Pool>, String)>> {
    let Some(database_url) = database_url(test) else {
        return Ok(None);
    };
    let pool = pgrepo::create_pool(&database_url)?;
    Ok(Some(setup_on(test, pool).await?))
}

async fn setup_on(test: &str, pool: Pool) -> RepoResult<(Repository<Account, Pool>, String)> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock before UNIX_EPOCH")
        .as_nanos();
    let table = format!("pgrepo_{test}_{}_{nanos}", std::process::id());

    pool.execute(
        &format!(
            "CREATE TABLE {table} (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL UNIQUE,
                status TEXT NOT NULL DEFAULT 'active',
                balance BIGINT NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL DEFAULT now()
            )"
        ),
        &[],
    )
    .await?;

    Ok((Repository::with_table(pool, table.clone())?, table))
}

async fn teardown(repo: &Repository<Account, Pool>) -> RepoResult<()> {
    repo.pool()
        .execute(&format!("DROP TABLE IF EXISTS {}", repo.table()), &[])
        .await?;
    Ok(())
}

fn account(email: &str, status: &str, balance: i64) -> ConditionMap {
    ConditionMap::comma()
        .bind("email", email.to_string())
        .bind("status", status.to_string())
        .bind("balance", balance)
}

async fn seed(repo: &Repository<Account, Pool>) -> RepoResult<()> {
    repo.create(&ConditionMapSet::new().insert_many([
        account("a@example.com", "active", 10),
        account("b@example.com", "active", 20),
        account("c@example.com", "closed", 30),
    ]))
    .await
}

#[tokio::test]
async fn create_then_find_by_key_val() -> RepoResult<()> {
    let Some((repo, _)) = setup("find").await? else {
        return Ok(());
    };
    seed(&repo).await?;

    let found = repo
        .find_by_key_val("email", "b@example.com", false)
        .await?
        .expect("seeded row");
    assert_eq!(found.email, "b@example.com");
    assert_eq!(found.status, "active");
    assert_eq!(found.balance, 20);
    assert!(found.created_at <= chrono::Utc::now());

    assert!(
        repo.find_by_key_val("email", "nobody@example.com", true)
            .await?
            .is_none()
    );

    let active = repo.find_all_by_key_val("status", "active", false).await?;
    assert_eq!(active.len(), 2);

    assert!(repo.exists("email", "a@example.com").await?);
    assert!(!repo.exists("email", "z@example.com").await?);

    teardown(&repo).await
}

#[tokio::test]
async fn find_by_map_filters_orders_and_paginates() -> RepoResult<()> {
    let Some((repo, _)) = setup("find_map").await? else {
        return Ok(());
    };
    seed(&repo).await?;

    let set = ConditionMapSet::new()
        .filter(ConditionMap::and().with_cmp(Op::Gte).bind("balance", 15i64))
        .order_by("balance", Direction::Desc);
    let rows = repo.find_all_by_map(&set, true).await?;
    let emails: Vec<_> = rows.iter().map(|a| a.email.as_str()).collect();
    assert_eq!(emails, ["c@example.com", "b@example.com"]);

    let page = repo
        .find_all_by_map(
            &ConditionMapSet::new()
                .order_by("id", Direction::Asc)
                .limit(1)
                .offset(1),
            true,
        )
        .await?;
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].email, "b@example.com");

    let either = ConditionMapSet::new().filter(
        ConditionMap::or()
            .bind("email", "a@example.com")
            .bind("status", "closed"),
    );
    assert_eq!(repo.count_by_map(&either).await?, 2);

    let listed = ConditionMapSet::new().filter(
        ConditionMap::and()
            .with_cmp(Op::In)
            .list("email", ["a@example.com", "c@example.com"]),
    );
    assert_eq!(repo.find_all_by_map(&listed, true).await?.len(), 2);

    let first = repo
        .find_by_map(
            &ConditionMapSet::new().order_by("balance", Direction::Asc),
            true,
        )
        .await?
        .expect("table is not empty");
    assert_eq!(first.balance, 10);

    teardown(&repo).await
}

#[tokio::test]
async fn update_by_map_returns_rows_only_when_asked() -> RepoResult<()> {
    let Some((repo, _)) = setup("update").await? else {
        return Ok(());
    };
    seed(&repo).await?;

    let credit = ConditionMapSet::new()
        .set(ConditionMap::comma().push("balance", Value::merge_chain(Op::Plus, [5i64])))
        .filter(ConditionMap::and().bind("status", "active"))
        .returning(ConditionMap::columns(["*"]));
    let updated = repo
        .update_by_map(&credit)
        .await?
        .expect("RETURNING was requested");
    let mut balances: Vec<_> = updated.iter().map(|a| a.balance).collect();
    balances.sort();
    assert_eq!(balances, [15, 25]);

    let close = ConditionMapSet::new()
        .set(ConditionMap::comma().bind("status", "closed"))
        .filter(ConditionMap::and().bind("email", "a@example.com"));
    assert!(repo.update_by_map(&close).await?.is_none());

    let closed = ConditionMapSet::new().filter(ConditionMap::and().bind("status", "closed"));
    assert_eq!(repo.count_by_map(&closed).await?, 2);

    teardown(&repo).await
}

#[tokio::test]
async fn upsert_and_conflicts() -> RepoResult<()> {
    let Some((repo, _)) = setup("upsert").await? else {
        return Ok(());
    };
    seed(&repo).await?;

    let dup = repo
        .create(&ConditionMapSet::new().insert(account("a@example.com", "active", 99)))
        .await
        .expect_err("email is unique");
    assert!(dup.is_unique_violation());

    repo.create(
        &ConditionMapSet::new()
            .insert(account("a@example.com", "active", 99))
            .on_conflict(["email"]),
    )
    .await?;
    let untouched = repo
        .find_by_key_val("email", "a@example.com", true)
        .await?
        .expect("seeded row");
    assert_eq!(untouched.balance, 10);

    repo.create(
        &ConditionMapSet::new()
            .insert(account("a@example.com", "active", 99))
            .on_conflict(["email"])
            .set(ConditionMap::comma().push("balance", Value::raw("balance = EXCLUDED.balance"))),
    )
    .await?;
    let replaced = repo
        .find_by_key_val("email", "a@example.com", true)
        .await?
        .expect("seeded row");
    assert_eq!(replaced.balance, 99);

    let mismatch = repo
        .create(&ConditionMapSet::new().insert_many([
            account("d@example.com", "active", 1),
            ConditionMap::comma()
                .bind("status", "active")
                .bind("email", "e@example.com")
                .bind("balance", 1i64),
        ]))
        .await
        .expect_err("column order differs");
    assert!(mismatch.is_schema_mismatch());

    teardown(&repo).await
}

#[tokio::test]
async fn delete_requires_conditions() -> RepoResult<()> {
    let Some((repo, _)) = setup("delete").await? else {
        return Ok(());
    };
    seed(&repo).await?;

    let err = repo
        .delete_by_map(&ConditionMapSet::new())
        .await
        .expect_err("unfiltered delete");
    assert!(err.is_validation());
    assert_eq!(repo.count_by_map(&ConditionMapSet::new()).await?, 3);

    repo.delete_by_map(
        &ConditionMapSet::new().filter(ConditionMap::and().bind("status", "closed")),
    )
    .await?;
    assert_eq!(repo.count_by_map(&ConditionMapSet::new()).await?, 2);

    teardown(&repo).await
}

#[tokio::test]
async fn execute_decodes_one_or_many() -> RepoResult<()> {
    let Some((repo, table)) = setup("execute").await? else {
        return Ok(());
    };
    seed(&repo).await?;

    let sql = format!("SELECT * FROM {table} WHERE email = $1");
    match repo.execute(&sql, &[&"a@example.com"]).await? {
        Fetched::One(a) => assert_eq!(a.balance, 10),
        Fetched::Many(rows) => panic!("expected one row, got {}", rows.len()),
    }

    let sql = format!("SELECT * FROM {table} WHERE balance > $1 ORDER BY id");
    let many = repo.execute(&sql, &[&0i64]).await?;
    assert!(matches!(&many, Fetched::Many(rows) if rows.len() == 3));

    let none = repo.execute(&sql, &[&1000i64]).await?;
    assert!(matches!(none, Fetched::Many(rows) if rows.is_empty()));

    let raw = repo
        .execute_raw(&format!("SELECT SUM(balance)::BIGINT AS total FROM {table}"), &[])
        .await?;
    let total: i64 = raw[0].get("total");
    assert_eq!(total, 60);

    teardown(&repo).await
}

#[tokio::test]
async fn transaction_commit_and_rollback() -> RepoResult<()> {
    let Some((repo, _)) = setup("tx").await? else {
        return Ok(());
    };
    seed(&repo).await?;

    let tx = repo.begin().await?;
    let locked = repo
        .find_and_lock_by_key_val(&tx, "email", "a@example.com", true)
        .await?
        .expect("seeded row");
    repo.update_by_map_tx(
        &tx,
        &ConditionMapSet::new()
            .set(ConditionMap::comma().bind("balance", locked.balance + 1))
            .filter(ConditionMap::and().bind("id", locked.id)),
    )
    .await?;
    tx.commit().await?;

    let after = repo
        .find_by_key_val("id", locked.id, true)
        .await?
        .expect("committed row");
    assert_eq!(after.balance, 11);

    let tx = repo.begin().await?;
    repo.create_tx(
        &tx,
        &ConditionMapSet::new().insert(account("tx@example.com", "active", 0)),
    )
    .await?;
    assert!(
        repo.find_by_key_val_tx(&tx, "email", "tx@example.com", true)
            .await?
            .is_some()
    );
    let locked = repo
        .find_all_and_lock_by_map(
            &tx,
            &ConditionMapSet::new().filter(ConditionMap::and().bind("status", "active")),
            true,
        )
        .await?;
    assert_eq!(locked.len(), 3);
    assert_eq!(repo.count_by_map_tx(&tx, &ConditionMapSet::new()).await?, 4);
    tx.rollback().await?;

    assert!(!repo.exists("email", "tx@example.com").await?);

    teardown(&repo).await
}

#[tokio::test]
async fn non_preload_reads_decode_the_full_record() -> RepoResult<()> {
    let Some(database_url) = database_url("non_preload") else {
        return Ok(());
    };
    // One connection, so every statement sees the session's TEMP table.
    let pool = pgrepo::create_pool_with_config(&PoolConfig::new(database_url).max_size(1))?;
    pool.execute(
        &format!(
            "CREATE TEMP TABLE {} (
                id BIGSERIAL PRIMARY KEY,
                email TEXT NOT NULL,
                password TEXT NOT NULL
            )",
            User::TABLE
        ),
        &[],
    )
    .await?;

    let users: Repository<User, Pool> = Repository::new(pool)?;
    assert_eq!(users.projection(), &Projection::columns(["id", "email"])?);

    users
        .create(
            &ConditionMapSet::new().insert(
                ConditionMap::comma()
                    .bind("email", "a@example.com")
                    .bind("password", "hash"),
            ),
        )
        .await?;

    let summary = users
        .find_by_key_val("email", "a@example.com", false)
        .await?
        .expect("inserted row");
    assert!(summary.id > 0);
    assert_eq!(summary.address, "a@example.com");
    assert_eq!(summary.password, "");

    let all = users.find_all_by_map(&ConditionMapSet::new(), false).await?;
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].password, "");

    let full = users
        .find_by_key_val("id", summary.id, true)
        .await?
        .expect("inserted row");
    assert_eq!(full.password, "hash");

    users
        .pool()
        .execute(&format!("DROP TABLE {}", User::TABLE), &[])
        .await?;
    Ok(())
}

#[tokio::test]
async fn dropped_transaction_never_returns_its_connection() -> RepoResult<()> {
    let Some(database_url) = database_url("dropped_tx") else {
        return Ok(());
    };
    let pool =
        pgrepo::create_pool_with_config(&PoolConfig::new(database_url.clone()).max_size(1))?;
    let (repo, table) = setup_on("dropped_tx", pool).await?;

    let tx = repo.begin().await?;
    repo.create_tx(
        &tx,
        &ConditionMapSet::new().insert(account("dropped@example.com", "active", 1)),
    )
    .await?;
    drop(tx);

    // The pool's only slot must now hold a connection outside any transaction.
    repo.create(&ConditionMapSet::new().insert(account("after@example.com", "active", 2)))
        .await?;
    let rows = repo
        .pool()
        .query("SELECT now() = statement_timestamp() AS autocommit", &[])
        .await?;
    let autocommit: bool = rows[0].get("autocommit");
    assert!(autocommit);

    let fresh: Repository<Account, Pool> =
        Repository::with_table(pgrepo::create_pool(&database_url)?, table)?;
    assert!(fresh.exists("email", "after@example.com").await?);
    assert!(!fresh.exists("email", "dropped@example.com").await?);
    assert_eq!(fresh.count_by_map(&ConditionMapSet::new()).await?, 1);

    teardown(&repo).await
}

#[tokio::test]
async fn invalid_maps_fail_before_reaching_the_database() -> RepoResult<()> {
    let Some((repo, _)) = setup("invalid").await? else {
        return Ok(());
    };

    let err = repo
        .find_all_by_map(
            &ConditionMapSet::new()
                .filter(ConditionMap::and().with_cmp(Op::Between).list("balance", [1i64])),
            true,
        )
        .await
        .expect_err("BETWEEN needs two bounds");
    assert!(matches!(err, RepoError::Validation(_)));

    let err = repo
        .update_by_map(
            &ConditionMapSet::new().filter(ConditionMap::and().bind("id", 1i64)),
        )
        .await
        .expect_err("UPDATE without SET");
    assert!(err.is_validation());

    teardown(&repo).await
}
