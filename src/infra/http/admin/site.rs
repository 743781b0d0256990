use axum::{
    Json,
    extract::State,
    response::Response,
};

use crate::application::{
    admin::{SiteBasicInput, TimeSlotInput, site::SiteScreen},
    error::HttpError,
};

use super::form::AdminForm;
use super::{AdminState, admin_error_to_http, see_other};

const SOURCE: &str = "infra::http::admin::site";
const SITE_PATH: &str = "/admin/site";

pub(super) async fn admin_site(
    State(state): State<AdminState>,
) -> Result<Json<SiteScreen>, HttpError> {
    state
        .site
        .screen()
        .await
        .map(Json)
        .map_err(|err| admin_error_to_http(SOURCE, err))
}

pub(super) async fn admin_site_basic(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = SiteBasicInput {
        site_name: form.owned("site_name"),
        phone: form.owned("phone"),
        email: form.owned("email"),
        address: form.owned("address"),
        city: form.owned("city"),
        state: form.owned("state"),
        zip: form.owned("zip"),
        hero_title: form.owned("hero_title"),
        hero_sub: form.owned("hero_sub"),
        show_weather: form.checked("show_weather"),
        facebook: form.owned("facebook"),
        instagram: form.owned("instagram"),
        tiktok: form.owned("tiktok"),
        youtube: form.owned("youtube"),
    };
    state
        .site
        .update_basic(input)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(SITE_PATH))
}

pub(super) async fn admin_site_hours(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = time_slot(&form, "dow")?;
    state
        .site
        .set_hours(input)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(SITE_PATH))
}

pub(super) async fn admin_site_holiday(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let input = time_slot(&form, "date")?;
    state
        .site
        .set_holiday(input)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(SITE_PATH))
}

pub(super) async fn admin_site_holiday_delete(
    State(state): State<AdminState>,
    form: AdminForm,
) -> Result<Response, HttpError> {
    let date = form.required("date")?;
    state
        .site
        .delete_holiday(date)
        .await
        .map_err(|err| admin_error_to_http(SOURCE, err))?;
    Ok(see_other(SITE_PATH))
}

pub(super) async fn admin_cache_invalidate(State(state): State<AdminState>) -> Response {
    state.site.invalidate_cache().await;
    see_other(SITE_PATH)
}

fn time_slot(form: &AdminForm, key_field: &str) -> Result<TimeSlotInput, HttpError> {
    Ok(TimeSlotInput {
        key: form.required(key_field)?.to_string(),
        open: form.text("open").unwrap_or_default().to_string(),
        close: form.text("close").unwrap_or_default().to_string(),
        closed: form.checked("closed"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hours_slot_reads_day_and_closed_box() {
        let form = AdminForm::from_pairs(&[
            ("dow", "mon"),
            ("open", "11:00"),
            ("close", "22:00"),
            ("closed", "on"),
        ]);
        let slot = time_slot(&form, "dow").expect("valid");
        assert_eq!(slot.key, "mon");
        assert_eq!(slot.open, "11:00");
        assert!(slot.closed);
    }

    #[test]
    fn holiday_slot_requires_date() {
        let form = AdminForm::from_pairs(&[("open", "11:00")]);
        assert!(time_slot(&form, "date").is_err());
    }
}
