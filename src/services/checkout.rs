//! Payment checkout links pre-filled from a submitted lead.

use url::Url;

use crate::constants::phone::BRAZIL_DDI;
use crate::models::LeadFormData;
use crate::services::enricher::UtmParams;
use crate::services::phone_formatter;

/// Append the lead's fields to `base` as checkout query parameters.
///
/// Existing query parameters on `base` are kept. The phone is split into
/// `ddd` and the local number, the latter stored under `phone_param`.
pub fn build_checkout_url(
    base: &str,
    form: &LeadFormData,
    utm: &UtmParams,
    phone_param: &str,
) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    let email = form.email.trim();
    let (ddd, number) = phone_formatter::split(&form.phone).unwrap_or_default();

    url.query_pairs_mut()
        .append_pair("utm_source", &utm.source)
        .append_pair("utm_medium", &utm.medium)
        .append_pair("name", form.name.trim())
        .append_pair("email", email)
        .append_pair("email_confirmation", email)
        .append_pair("ddi", BRAZIL_DDI)
        .append_pair("ddd", &ddd)
        .append_pair(phone_param, &number);

    Ok(url.into())
}
