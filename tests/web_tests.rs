use anyhow::Result;
use axum::body::Body;
use axum::http::{header, Request, Response, StatusCode};
use axum::Router;
use chrono::Utc;
use std::sync::Arc;
use tower::ServiceExt;
use uuid::Uuid;

use lab_catalogo::domain::Exam;
use lab_catalogo::storage::{CatalogStore, InMemoryStore};
use lab_catalogo::web::session::SessionStore;
use lab_catalogo::web::{router, AppState};

fn test_app() -> (Router, Arc<InMemoryStore>) {
    let store = Arc::new(InMemoryStore::new());
    let sessions = Arc::new(SessionStore::new("test-secret"));
    let app = router(AppState {
        store: store.clone(),
        sessions,
    });
    (app, store)
}

fn get_request(path: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn form_request(path: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response<axum::body::Body> {
    app.clone().oneshot(request).await.unwrap()
}

fn session_cookie(response: &Response<axum::body::Body>) -> Option<String> {
    let header = response.headers().get(header::SET_COOKIE)?.to_str().ok()?;
    header.split(';').next().map(|s| s.to_string())
}

fn location(response: &Response<axum::body::Body>) -> Option<String> {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
}

async fn body_string(response: Response<axum::body::Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8_lossy(&bytes).to_string()
}

/// Registers `ana` and logs her in, returning the session cookie.
async fn authenticated_cookie(app: &Router) -> String {
    let response = send(
        app,
        form_request(
            "/register",
            "username=ana&password=secreto&confirm_password=secreto",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = send(
        app,
        form_request("/login", "username=ana&password=secreto", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/home"));

    session_cookie(&response).expect("login establishes a session cookie")
}

fn exam(codigo: &str, categoria: &str, tipo_muestra: &str, precio: &str, inds: &[&str]) -> Exam {
    Exam {
        id: None,
        codigo: codigo.to_string(),
        categoria: categoria.to_string(),
        tipo_muestra: tipo_muestra.to_string(),
        precio: precio.to_string(),
        indicaciones: inds.iter().map(|s| s.to_string()).collect(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn duplicate_registration_fails_and_keeps_the_original_password() -> Result<()> {
    let (app, store) = test_app();

    let response = send(
        &app,
        form_request(
            "/register",
            "username=ana&password=primera&confirm_password=primera",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    let response = send(
        &app,
        form_request(
            "/register",
            "username=ana&password=segunda&confirm_password=segunda",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "form is redisplayed");
    let body = body_string(response).await;
    assert!(body.contains("ya está en uso"));

    let user = store.get_user_by_username("ana").await?.unwrap();
    assert_eq!(user.password, "primera");
    Ok(())
}

#[tokio::test]
async fn mismatched_passwords_do_not_register() -> Result<()> {
    let (app, store) = test_app();

    let response = send(
        &app,
        form_request(
            "/register",
            "username=ana&password=una&confirm_password=otra",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains("no coinciden"));

    assert!(store.get_user_by_username("ana").await?.is_none());
    Ok(())
}

#[tokio::test]
async fn wrong_password_fails_and_establishes_no_session() {
    let (app, _store) = test_app();

    send(
        &app,
        form_request(
            "/register",
            "username=ana&password=secreto&confirm_password=secreto",
            None,
        ),
    )
    .await;

    let response = send(
        &app,
        form_request("/login", "username=ana&password=equivocada", None),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK, "login form redisplayed");
    let cookie = session_cookie(&response);

    // The anonymous session that was handed out must not grant access.
    let response = send(&app, get_request("/home", cookie.as_deref())).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn unauthenticated_requests_are_redirected_before_the_handler_runs() {
    let (app, store) = test_app();

    let response = send(&app, get_request("/catalogo", None)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));

    // A protected mutation is blocked too: nothing is written.
    let response = send(
        &app,
        form_request(
            "/crear_examen",
            "codigo=EX1&categoria=Hematology&tipo_muestra=Blood&precio=150",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
    assert_eq!(store.exam_count(), 0);
}

#[tokio::test]
async fn guard_flash_is_shown_once_on_the_login_page() {
    let (app, _store) = test_app();

    let response = send(&app, get_request("/catalogo", None)).await;
    let cookie = session_cookie(&response).expect("guard hands out a session for the flash");

    let response = send(&app, get_request("/login", Some(&cookie))).await;
    let body = body_string(response).await;
    assert!(body.contains("Debes iniciar sesión"));

    let response = send(&app, get_request("/login", Some(&cookie))).await;
    let body = body_string(response).await;
    assert!(!body.contains("Debes iniciar sesión"), "flash already drained");
}

#[tokio::test]
async fn created_exam_appears_in_the_listing_with_exact_values() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let response = send(
        &app,
        form_request(
            "/crear_examen",
            "codigo=EX1&categoria=Hematology&tipo_muestra=Blood&precio=150&indicaciones=Fever",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/catalogo"));

    let exams = store.get_all_exams().await?;
    assert_eq!(exams.len(), 1);
    assert_eq!(exams[0].codigo, "EX1");
    assert_eq!(exams[0].categoria, "Hematology");
    assert_eq!(exams[0].tipo_muestra, "Blood");
    assert_eq!(exams[0].precio, "150");
    assert_eq!(exams[0].indicaciones, vec!["Fever".to_string()]);

    let response = send(&app, get_request("/ver_examenes", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    for value in ["EX1", "Hematology", "Blood", "150", "Fever"] {
        assert!(body.contains(value), "listing should show {value}");
    }
    Ok(())
}

#[tokio::test]
async fn editing_fully_replaces_all_fields() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let mut existing = exam("EX1", "Hematologia", "Sangre", "150", &["Fiebre", "Tos"]);
    store.create_exam(&mut existing).await?;
    let id = existing.id.unwrap();

    // The submission drops `indicaciones` entirely; nothing of the old list
    // may survive.
    let response = send(
        &app,
        form_request(
            &format!("/editar_examen/{id}"),
            "codigo=EX2&categoria=Quimica&tipo_muestra=Orina&precio=80",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let updated = store.get_exam_by_id(id).await?.unwrap();
    assert_eq!(updated.codigo, "EX2");
    assert_eq!(updated.categoria, "Quimica");
    assert_eq!(updated.tipo_muestra, "Orina");
    assert_eq!(updated.precio, "80");
    assert!(updated.indicaciones.is_empty(), "old indicaciones are gone");
    Ok(())
}

#[tokio::test]
async fn deleting_a_nonexistent_exam_leaves_the_collection_unchanged() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let mut existing = exam("EX1", "Hematologia", "Sangre", "150", &[]);
    store.create_exam(&mut existing).await?;

    let before = store.exam_count();
    let response = send(
        &app,
        form_request(
            &format!("/eliminar_examen/{}", Uuid::new_v4()),
            "",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.exam_count(), before);
    Ok(())
}

#[tokio::test]
async fn categoria_filter_takes_precedence_over_tipo_muestra() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let mut a = exam("HEMA1", "Hematologia", "Sangre", "100", &[]);
    let mut b = exam("MICRO1", "Microbiologia", "Sangre", "200", &[]);
    store.create_exam(&mut a).await?;
    store.create_exam(&mut b).await?;

    // Both filters set: the categoria filter must win outright, so the
    // tipo_muestra match on MICRO1 is ignored.
    let response = send(
        &app,
        get_request(
            "/catalogo?categoria=Hematologia&tipo_muestra=Sangre",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let both = body_string(response).await;

    let response = send(
        &app,
        get_request("/catalogo?categoria=Hematologia", Some(&cookie)),
    )
    .await;
    let categoria_only = body_string(response).await;

    assert!(both.contains("HEMA1"));
    assert!(!both.contains("MICRO1"));
    assert!(categoria_only.contains("HEMA1"));
    assert!(!categoria_only.contains("MICRO1"));
    Ok(())
}

#[tokio::test]
async fn empty_filters_fall_back_to_the_full_catalog() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let mut a = exam("HEMA1", "Hematologia", "Sangre", "100", &[]);
    let mut b = exam("MICRO1", "Microbiologia", "Orina", "200", &[]);
    store.create_exam(&mut a).await?;
    store.create_exam(&mut b).await?;

    let response = send(
        &app,
        get_request("/catalogo?categoria=&tipo_muestra=", Some(&cookie)),
    )
    .await;
    let body = body_string(response).await;
    assert!(body.contains("HEMA1"));
    assert!(body.contains("MICRO1"));
    Ok(())
}

#[tokio::test]
async fn report_shows_all_three_aggregates() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    for (codigo, precio, inds) in [
        ("EX1", "50", vec!["Fever"]),
        ("EX2", "150", vec!["Fever"]),
        ("EX3", "450", vec!["Fever"]),
        ("EX4", "999", vec!["Cough"]),
    ] {
        let mut e = exam(codigo, "Hematologia", "Sangre", precio, &[]);
        e.indicaciones = inds.into_iter().map(String::from).collect();
        store.create_exam(&mut e).await?;
    }

    let response = send(&app, get_request("/reporte", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;

    assert!(body.contains("Hematologia"));
    assert!(body.contains("Fever"), "Fever is the most common indication");
    assert!(body.contains("500+"));
    assert!(body.contains("Other"));
    Ok(())
}

#[tokio::test]
async fn viewing_a_missing_exam_degrades_to_a_flash_and_redirect() {
    let (app, _store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let response = send(
        &app,
        get_request(&format!("/ver_examen/{}", Uuid::new_v4()), Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/catalogo"));
}

#[tokio::test]
async fn logout_clears_the_session() {
    let (app, _store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let response = send(&app, get_request("/logout", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/"));

    let response = send(&app, get_request("/home", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/login"));
}

#[tokio::test]
async fn category_crud_round_trip() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let response = send(
        &app,
        form_request(
            "/crear_categoria",
            "nombre=Hematologia&descripcion=Estudios+de+sangre",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/ver_categorias"));

    let categorias = store.get_all_categories().await?;
    let categoria = &categorias[0];
    let id = categoria.id.unwrap();
    assert_eq!(categoria.nombre, "Hematologia");
    assert_eq!(categoria.descripcion, "Estudios de sangre");

    let response = send(
        &app,
        form_request(
            &format!("/editar_categoria/{id}"),
            "nombre=Quimica&descripcion=Perfil+quimico",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(store.get_category_by_id(id).await?.unwrap().nombre, "Quimica");

    let response = send(
        &app,
        form_request(&format!("/eliminar_categoria/{id}"), "", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(store.get_category_by_id(id).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn deleting_a_category_does_not_cascade_to_exams() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let response = send(
        &app,
        form_request(
            "/crear_categoria",
            "nombre=Hematologia&descripcion=x",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let mut e = exam("EX1", "Hematologia", "Sangre", "100", &[]);
    store.create_exam(&mut e).await?;

    let id = store.get_all_categories().await?[0].id.unwrap();
    send(
        &app,
        form_request(&format!("/eliminar_categoria/{id}"), "", Some(&cookie)),
    )
    .await;

    // The exam keeps the orphaned category name.
    let exams = store.get_all_exams().await?;
    assert_eq!(exams[0].categoria, "Hematologia");
    Ok(())
}

#[tokio::test]
async fn indication_crud_round_trip() -> Result<()> {
    let (app, store) = test_app();
    let cookie = authenticated_cookie(&app).await;

    let response = send(
        &app,
        form_request(
            "/crear_indicacion",
            "nombre=Ayuno&descripcion=Ocho+horas+de+ayuno",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response).as_deref(), Some("/ver_indicaciones"));

    let indicaciones = store.get_all_indications().await?;
    let indicacion = &indicaciones[0];
    let id = indicacion.id.unwrap();
    assert_eq!(indicacion.nombre, "Ayuno");

    let response = send(
        &app,
        form_request(
            &format!("/editar_indicacion/{id}"),
            "nombre=Ayuno+nocturno&descripcion=x",
            Some(&cookie),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        store.get_indication_by_id(id).await?.unwrap().nombre,
        "Ayuno nocturno"
    );

    let response = send(
        &app,
        form_request(&format!("/eliminar_indicacion/{id}"), "", Some(&cookie)),
    )
    .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(store.get_indication_by_id(id).await?.is_none());
    Ok(())
}
