use crate::core::catalog::Catalog;
use crate::domain::model::{BookingDetails, Category, Service};
use crate::domain::money::Money;
use std::fmt::Write;

const INDEX_TEMPLATE: &str = include_str!("../../templates/index.html");

/// Everything the landing page needs besides the catalog.
#[derive(Debug, Clone)]
pub struct LandingContext {
    pub site_name: String,
    pub tagline: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub deposit: Option<Money>,
    pub availability_enabled: bool,
}

pub fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn category_slug(category: Category) -> &'static str {
    match category {
        Category::Injectables => "injectables",
        Category::Prp => "prp",
        Category::Peels => "peels",
    }
}

fn render_service(out: &mut String, service: &Service) {
    let _ = write!(
        out,
        r#"        <article class="service">
          <h3>{}</h3>
          <p class="details">{}</p>
          <dl>
            <dt>Price</dt><dd>{}</dd>
            <dt>Duration</dt><dd>{}</dd>
          </dl>
        </article>
"#,
        escape_html(&service.name),
        escape_html(&service.details),
        escape_html(&service.price),
        escape_html(&service.duration),
    );
}

fn render_sections(catalog: &Catalog) -> String {
    let mut out = String::new();
    for (category, services) in catalog.sections() {
        if services.is_empty() {
            continue;
        }
        let _ = writeln!(
            out,
            r#"    <section class="catalog" id="{}">
      <h2>{}</h2>
      <div class="grid">"#,
            category_slug(category),
            category.title()
        );
        for service in services {
            render_service(&mut out, service);
        }
        out.push_str("      </div>\n    </section>\n");
    }
    out
}

fn render_booking(ctx: &LandingContext, catalog: &Catalog) -> String {
    let Some(deposit) = &ctx.deposit else {
        let phone = ctx
            .phone
            .as_deref()
            .map(|p| format!(" Call us at {} to book.", escape_html(p)))
            .unwrap_or_default();
        return format!(
            "      <p class=\"notice\">Online deposits are not available.{}</p>\n",
            phone
        );
    };

    let mut options = String::new();
    for (category, services) in catalog.sections() {
        if services.is_empty() {
            continue;
        }
        let _ = writeln!(options, r#"          <optgroup label="{}">"#, category.title());
        for service in services {
            let name = escape_html(&service.name);
            let _ = writeln!(options, r#"            <option value="{0}">{0}</option>"#, name);
        }
        options.push_str("          </optgroup>\n");
    }

    let slot_picker = if ctx.availability_enabled {
        r#"        <label>Time<select name="slot_start" id="slot-select" required></select></label>
"#
    } else {
        ""
    };

    format!(
        r#"      <p class="deposit">A {deposit} deposit secures your appointment and is applied to your treatment.</p>
      <form id="booking-form">
        <label>Treatment<select name="service" id="service-select" required>
{options}        </select></label>
        <label>Name<input name="customer_name" autocomplete="name" required></label>
        <label>Email<input name="email" type="email" autocomplete="email" required></label>
        <label>Phone<input name="phone" type="tel" autocomplete="tel"></label>
{slot_picker}        <div id="card-container"></div>
        <button type="submit">Pay {deposit} deposit</button>
        <p id="booking-status" role="status"></p>
      </form>
"#,
        deposit = escape_html(&deposit.to_string()),
        options = options,
        slot_picker = slot_picker,
    )
}

fn render_contact(ctx: &LandingContext) -> String {
    let mut out = format!("    <p>&copy; {}</p>\n", escape_html(&ctx.site_name));
    if let Some(address) = &ctx.address {
        let _ = writeln!(out, "    <p class=\"address\">{}</p>", escape_html(address));
    }
    if let Some(phone) = &ctx.phone {
        let _ = writeln!(
            out,
            "    <p class=\"phone\"><a href=\"tel:{0}\">{0}</a></p>",
            escape_html(phone)
        );
    }
    out
}

/// Single pass over `template`; substituted text is never scanned for placeholders again.
fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return out;
        };

        let key = &after[..end];
        match values.iter().find(|(name, _)| *name == key) {
            Some((_, value)) => out.push_str(value),
            None => out.push_str(&rest[start..start + 2 + end + 2]),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    out
}

pub fn render_landing(ctx: &LandingContext, catalog: &Catalog) -> String {
    let tagline = ctx.tagline.as_deref().unwrap_or("Cosmetic booking experience");
    let site_name = escape_html(&ctx.site_name);
    let tagline = escape_html(tagline);
    let sections = render_sections(catalog);
    let booking = render_booking(ctx, catalog);
    let contact = render_contact(ctx);

    fill_template(
        INDEX_TEMPLATE,
        &[
            ("site_name", site_name.as_str()),
            ("tagline", tagline.as_str()),
            ("sections", sections.as_str()),
            ("booking", booking.as_str()),
            ("contact", contact.as_str()),
        ],
    )
}

pub fn confirmation_subject(site_name: &str) -> String {
    format!("Your {} appointment request", site_name)
}

pub fn confirmation_html(site_name: &str, details: &BookingDetails) -> String {
    let mut rows = String::new();
    let _ = writeln!(
        rows,
        "<tr><td>Treatment</td><td>{}</td></tr>",
        escape_html(&details.service)
    );
    if let Some(slot) = &details.slot_label {
        let _ = writeln!(rows, "<tr><td>Requested time</td><td>{}</td></tr>", escape_html(slot));
    }
    if let Some(deposit) = &details.deposit {
        let _ = writeln!(
            rows,
            "<tr><td>Deposit paid</td><td>{}</td></tr>",
            escape_html(&deposit.to_string())
        );
    }
    if let Some(payment_id) = &details.payment_id {
        let _ = writeln!(rows, "<tr><td>Payment reference</td><td>{}</td></tr>", escape_html(payment_id));
    }

    format!(
        r#"<div style="font-family:Helvetica,Arial,sans-serif;color:#2b2b2b">
<h2>Thank you, {name}!</h2>
<p>We received your appointment request at {site}. Our team will confirm the final time with you shortly.</p>
<table cellpadding="6">
{rows}</table>
<p>Reply to this email if you need to reschedule.</p>
</div>"#,
        name = escape_html(&details.customer_name),
        site = escape_html(site_name),
        rows = rows,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(deposit: Option<Money>) -> LandingContext {
        LandingContext {
            site_name: "Glow Atelier".to_string(),
            tagline: None,
            phone: Some("(555) 010-2030".to_string()),
            address: None,
            deposit,
            availability_enabled: true,
        }
    }

    #[test]
    fn test_placeholders_in_content_stay_literal() {
        let mut context = ctx(None);
        context.site_name = "Glow {{booking}} Atelier".to_string();
        context.tagline = Some("{{contact}}".to_string());
        let html = render_landing(&context, &Catalog::glow_atelier());

        assert!(html.contains("<title>Glow {{booking}} Atelier</title>"));
        assert!(html.contains(r#"<p class="tagline">{{contact}}</p>"#));
        assert_eq!(html.matches("Online deposits are not available.").count(), 1);
    }

    #[test]
    fn test_fill_template_keeps_unknown_and_unclosed_placeholders() {
        assert_eq!(
            fill_template("a {{x}} {{y}} {{z", &[("x", "1")]),
            "a 1 {{y}} {{z"
        );
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#39;y&#39;"
        );
    }

    #[test]
    fn test_landing_lists_sections_in_order() {
        let html = render_landing(&ctx(None), &Catalog::glow_atelier());

        let injectables = html.find("<h2>Injectables</h2>").unwrap();
        let prp = html.find("<h2>PRP</h2>").unwrap();
        let peels = html.find("<h2>Peels</h2>").unwrap();
        assert!(injectables < prp && prp < peels);
        assert!(html.contains("Botox with Farah"));
        assert!(html.contains("Brighten + thicken skin"));
        assert!(html.contains("<title>Glow Atelier</title>"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn test_landing_without_payments_shows_notice() {
        let html = render_landing(&ctx(None), &Catalog::glow_atelier());
        assert!(html.contains("Online deposits are not available. Call us at (555) 010-2030 to book."));
        assert!(!html.contains("booking-form"));
    }

    #[test]
    fn test_landing_with_payments_shows_deposit_form() {
        let html = render_landing(&ctx(Some(Money::usd(5000))), &Catalog::glow_atelier());
        assert!(html.contains("Pay $50.00 deposit"));
        assert!(html.contains(r#"<option value="Lip filler">Lip filler</option>"#));
        assert!(html.contains("slot-select"));
    }

    #[test]
    fn test_landing_escapes_catalog_text() {
        let mut catalog = Catalog::glow_atelier();
        catalog.peels[0].name = "<b>Peel</b>".to_string();
        let html = render_landing(&ctx(None), &catalog);
        assert!(html.contains("&lt;b&gt;Peel&lt;/b&gt;"));
        assert!(!html.contains("<b>Peel</b>"));
    }

    #[test]
    fn test_confirmation_html() {
        let details = BookingDetails {
            customer_name: "Layla <3".to_string(),
            email: "layla@example.com".to_string(),
            service: "Lip filler".to_string(),
            slot_label: Some("Tue, Oct 20 at 10:30 AM PDT".to_string()),
            deposit: Some(Money::usd(5000)),
            payment_id: Some("pay_123".to_string()),
        };
        let html = confirmation_html("Glow Atelier", &details);

        assert!(html.contains("Thank you, Layla &lt;3!"));
        assert!(html.contains("<td>Deposit paid</td><td>$50.00</td>"));
        assert!(html.contains("pay_123"));
        assert_eq!(confirmation_subject("Glow Atelier"), "Your Glow Atelier appointment request");
    }
}
