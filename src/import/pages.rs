//! HTML landing pages for the import flow.
//!
//! Pure rendering: every page is a function of [`PageParams`] and the
//! static [`ImportConfig`]. Request-derived values are escaped for the
//! context they land in.

use serde_json::{json, Value};

use crate::config::ImportConfig;

/// Per-request values shared by every page.
#[derive(Debug, Clone, Copy)]
pub struct PageParams<'a> {
    /// `https://{host}/sub/{name}`
    pub sub_url: &'a str,
    pub host: &'a str,
    /// Client name, used to build the Happ launch link.
    pub alias: &'a str,
}

impl PageParams<'_> {
    /// Link back into this gateway's Happ flow.
    pub fn happ_launch_url(&self) -> String {
        format!("https://{}/i/{}/happ", self.host, self.alias)
    }
}

/// `{scheme}://import/{sub_url}`
pub fn deep_link(scheme: &str, sub_url: &str) -> String {
    format!("{scheme}://import/{sub_url}")
}

/// Delay before a landing page follows the selected deep link.
const DEEP_LINK_DELAY_MS: u32 = 140;

/// Delay before the Happ fallback page submits to the generator.
const GENERATOR_SUBMIT_DELAY_MS: u32 = 120;

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            c => out.push(c),
        }
    }
    out
}

/// JSON literal safe to embed inside a `<script>` element.
fn script_json(value: &Value) -> String {
    serde_json::to_string(value)
        .unwrap_or_else(|_| "null".to_string())
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

fn head(title: &str, style: &str) -> String {
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <meta name=\"viewport\" content=\"width=device-width,initial-scale=1\">\
         <title>{}</title><style>{}</style></head><body>",
        escape_html(title),
        style
    )
}

const MENU_STYLE: &str = ":root{--line:#24324a;--txt:#e8f0ff;--muted:#9ab0d5;--accent:#2dd4bf;--accent2:#3b82f6}\
*{box-sizing:border-box}body{margin:0;font-family:system-ui,-apple-system,Segoe UI,Roboto,sans-serif;color:var(--txt);\
background:radial-gradient(1200px 520px at 8% -10%,#1b2c4a 0%,#0a1120 48%,#070c16 100%)}\
.wrap{max-width:940px;margin:0 auto;padding:18px}.card{background:#0f1728;border:1px solid var(--line);border-radius:22px;padding:18px}\
.logo{font-size:24px;font-weight:800}.muted{color:var(--muted)}.tabs{display:flex;gap:10px;flex-wrap:wrap;margin:14px 0}\
.tab{padding:10px 14px;border-radius:12px;border:1px solid var(--line);background:#121d32;color:var(--txt);cursor:pointer;font-weight:700}\
.tab.active{color:#071620;border-color:transparent;background:linear-gradient(90deg,var(--accent),var(--accent2))}\
.apps{display:grid;grid-template-columns:1fr 1fr;gap:10px;margin:10px 0}\
.app{padding:12px;border-radius:14px;border:1px solid var(--line);background:#121d32;color:var(--txt);cursor:pointer;text-align:left;font-weight:800}\
.app.active{border-color:#7dd9ff}.btns{display:flex;gap:10px;flex-wrap:wrap;margin:14px 0}\
.btn{display:inline-block;border:1px solid transparent;cursor:pointer;text-decoration:none;padding:12px 15px;border-radius:12px;font-weight:800;font-size:14px}\
.btn.main{color:#071620;background:linear-gradient(90deg,var(--accent),var(--accent2))}.btn.alt{color:var(--txt);background:#121d32;border-color:var(--line)}\
.hint{margin:6px 0 10px;padding:9px 11px;border-radius:10px;background:#101f36;border:1px solid #2c4b73;color:#b7d6ff}\
.guide li{margin:6px 0;color:var(--muted)}@media (max-width:640px){.apps{grid-template-columns:1fr}.btn{width:100%;text-align:center}}";

const MOBILE_STYLE: &str = ":root{--line:#25324e;--text:#e9eefc;--muted:#9fb1d3;--acc:#2dd4bf;--acc2:#38bdf8}\
*{box-sizing:border-box}body{margin:0;font-family:system-ui,-apple-system,Segoe UI,Roboto,Ubuntu,sans-serif;\
background:radial-gradient(1200px 700px at 10% -10%,#1e293b 0%,#0b1220 45%,#090f1b 100%);color:var(--text)}\
.wrap{max-width:760px;margin:0 auto;padding:20px}.panel{background:#121c30;border:1px solid var(--line);border-radius:18px;padding:18px}\
h1{margin:0 0 6px;font-size:26px}p{margin:8px 0;color:var(--muted)}.apps{display:grid;grid-template-columns:1fr 1fr;gap:10px;margin:14px 0 8px}\
.app{border:1px solid var(--line);border-radius:12px;padding:12px;background:#0f1729;color:var(--text);cursor:pointer;text-align:left}\
.app.active{border-color:var(--acc2)}.name{font-weight:700}.btns{display:flex;flex-wrap:wrap;gap:10px;margin:14px 0}\
.btn{display:inline-block;text-decoration:none;color:#07131f;background:linear-gradient(90deg,var(--acc),var(--acc2));padding:12px 14px;border-radius:10px;font-weight:700}\
.btn.alt{background:#18243b;color:var(--text);border:1px solid var(--line)}\
.meta{font-size:13px;word-break:break-all;background:#0a1222;border:1px solid var(--line);border-radius:10px;padding:10px}\
@media (max-width:560px){.apps{grid-template-columns:1fr}}";

fn app_entry(id: &str, name: &str, store: &str, mode: &str, link: &str) -> Value {
    json!({ "id": id, "name": name, "store": store, "mode": mode, "link": link })
}

/// Platform-selection page for a bare `/i/{key}`.
///
/// The default platform is picked client-side from `navigator.userAgent`;
/// `?platform=android|ios|macos|windows` overrides it.
pub fn menu_page(params: &PageParams<'_>, config: &ImportConfig) -> String {
    let stores = &config.stores;
    let v2_link = deep_link(&config.deep_link_scheme, params.sub_url);
    let happ_link = params.happ_launch_url();

    let cfg = json!({
        "subUrl": params.sub_url,
        "apps": {
            "android": [
                app_entry("v2", "v2RayTun", &stores.v2raytun_android, "deeplink", &v2_link),
                app_entry("happ", "Happ", &stores.happ_android, "deeplink", &happ_link),
            ],
            "ios": [
                app_entry("v2", "v2RayTun", &stores.v2raytun_ios, "deeplink", &v2_link),
                app_entry("happ", "Happ", &stores.happ_ios, "deeplink", &happ_link),
            ],
            "macos": [
                app_entry("v2", "v2RayTun", &stores.v2raytun_macos, "deeplink", &v2_link),
                app_entry("happ", "Happ", &stores.happ_macos, "deeplink", &happ_link),
            ],
            "windows": [
                app_entry("v2", "v2RayTun", &stores.v2raytun_windows, "open", params.sub_url),
                app_entry("happ", "Happ", &stores.happ_windows, "deeplink", &happ_link),
            ],
        },
    });

    let mut html = head(&format!("{} Setup", config.brand), MENU_STYLE);
    html.push_str(&format!(
        "<div class=\"wrap\"><div class=\"card\"><div class=\"logo\">{brand}</div>\
         <p class=\"muted\">Choose your platform and app.</p>\
         <div class=\"tabs\">\
         <button id=\"tab-android\" class=\"tab\" type=\"button\">Android</button>\
         <button id=\"tab-ios\" class=\"tab\" type=\"button\">iOS</button>\
         <button id=\"tab-macos\" class=\"tab\" type=\"button\">macOS</button>\
         <button id=\"tab-windows\" class=\"tab\" type=\"button\">Windows</button></div>\
         <div id=\"apps\" class=\"apps\"></div>\
         <div class=\"btns\"><a id=\"install\" class=\"btn alt\" href=\"#\">Install app</a>\
         <button id=\"import\" class=\"btn main\" type=\"button\">Add subscription</button>\
         <a class=\"btn alt\" href=\"{support}\" target=\"_blank\" rel=\"noopener\">Support</a></div>\
         <div class=\"hint\" id=\"hint\"></div>\
         <div class=\"guide\"><ol>\
         <li>Pick your platform.</li><li>Install the recommended app.</li>\
         <li>Press \u{ab}Add subscription\u{bb} and allow the app to open.</li>\
         <li>In the app, refresh the subscription and enable the profile.</li></ol>\
         <p class=\"muted\">Subscription URL: {sub_url}</p></div></div></div>",
        brand = escape_html(&config.brand),
        support = escape_html(&config.support_chat_url),
        sub_url = escape_html(params.sub_url),
    ));

    html.push_str("<script>(function(){var cfg=");
    html.push_str(&script_json(&cfg));
    html.push_str(
        ";var state={platform:\"android\",app:\"v2\"};var ua=navigator.userAgent;\
         if(/iPhone|iPad|iPod/i.test(ua)){state.platform=\"ios\";}\
         else if(/Macintosh|Mac OS X/i.test(ua)){state.platform=\"macos\";}\
         else if(/Windows NT/i.test(ua)){state.platform=\"windows\";}\
         var qp=new URLSearchParams(location.search).get(\"platform\");\
         if(qp&&Object.prototype.hasOwnProperty.call(cfg.apps,qp)){state.platform=qp;}\
         var appsEl=document.getElementById(\"apps\"),installEl=document.getElementById(\"install\"),\
         importEl=document.getElementById(\"import\"),hintEl=document.getElementById(\"hint\");\
         var names=[\"android\",\"ios\",\"macos\",\"windows\"];\
         function list(){return cfg.apps[state.platform];}\
         function selected(){var l=list();for(var i=0;i<l.length;i++){if(l[i].id===state.app){return l[i];}}return l[0];}\
         function renderApps(){var l=list();appsEl.innerHTML=\"\";l.forEach(function(a){\
         var b=document.createElement(\"button\");b.type=\"button\";b.className=\"app\"+(a.id===selected().id?\" active\":\"\");\
         b.textContent=a.name;b.addEventListener(\"click\",function(){state.app=a.id;refresh();});appsEl.appendChild(b);});}\
         function hint(){if(state.platform===\"android\"||state.platform===\"ios\"){\
         return \"v2RayTun is selected by default. After importing, open the app and enable the profile.\";}\
         return \"v2RayTun and Happ are available. Install an app and press Add subscription.\";}\
         function refresh(){names.forEach(function(n){document.getElementById(\"tab-\"+n).classList.toggle(\"active\",n===state.platform);});\
         renderApps();installEl.href=selected().store;hintEl.textContent=hint();}\
         names.forEach(function(n){document.getElementById(\"tab-\"+n).addEventListener(\"click\",function(){state.platform=n;state.app=\"v2\";refresh();});});\
         importEl.addEventListener(\"click\",function(){window.location.href=selected().link;});\
         refresh();})();</script></body></html>",
    );
    html
}

/// Which mobile landing page to render.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MobilePlatform {
    Ios,
    Android,
}

impl MobilePlatform {
    fn label(&self) -> &'static str {
        match self {
            MobilePlatform::Ios => "iOS",
            MobilePlatform::Android => "Android",
        }
    }

    fn stores<'a>(&self, config: &'a ImportConfig) -> (&'a str, &'a str) {
        match self {
            MobilePlatform::Ios => (config.stores.v2raytun_ios.as_str(), config.stores.happ_ios.as_str()),
            MobilePlatform::Android => (
                config.stores.v2raytun_android.as_str(),
                config.stores.happ_android.as_str(),
            ),
        }
    }
}

/// iOS or Android landing page. Follows the selected app's link after a
/// short delay unless the user switches apps first.
pub fn mobile_page(
    platform: MobilePlatform,
    params: &PageParams<'_>,
    config: &ImportConfig,
) -> String {
    let (v2_store, happ_store) = platform.stores(config);
    let v2_link = deep_link(&config.deep_link_scheme, params.sub_url);
    let happ_link = params.happ_launch_url();
    let label = platform.label();

    let apps = json!({
        "v2": { "store": v2_store, "link": v2_link },
        "happ": { "store": happ_store, "link": happ_link },
    });

    let mut html = head(&format!("{} - {}", config.brand, label), MOBILE_STYLE);
    html.push_str(&format!(
        "<div class=\"wrap\"><div class=\"panel\"><h1>{brand}</h1>\
         <p>{label} setup and subscription import.</p>\
         <div class=\"apps\">\
         <button class=\"app active\" id=\"v2\" type=\"button\"><div class=\"name\">v2RayTun</div><p>Recommended for {label}</p></button>\
         <button class=\"app\" id=\"happ\" type=\"button\"><div class=\"name\">Happ</div><p>Alternative client for {label}</p></button>\
         </div><div class=\"btns\">\
         <a class=\"btn alt\" id=\"install\" href=\"{v2_store}\">Install app</a>\
         <a class=\"btn\" id=\"import\" href=\"{v2_link}\">Add subscription</a></div>\
         <p>Manual URL (copy if the app did not open):</p>\
         <div class=\"meta\">{sub_url}</div></div></div>",
        brand = escape_html(&config.brand),
        v2_store = escape_html(v2_store),
        v2_link = escape_html(&v2_link),
        sub_url = escape_html(params.sub_url),
    ));

    html.push_str("<script>(function(){var selected=\"v2\";var apps=");
    html.push_str(&script_json(&apps));
    html.push_str(
        ";var v2=document.getElementById(\"v2\"),h=document.getElementById(\"happ\"),\
         i=document.getElementById(\"import\"),s=document.getElementById(\"install\");\
         function apply(k){selected=k;v2.classList.toggle(\"active\",k===\"v2\");h.classList.toggle(\"active\",k===\"happ\");\
         i.href=apps[k].link;s.href=apps[k].store;}\
         v2.addEventListener(\"click\",function(){apply(\"v2\");});h.addEventListener(\"click\",function(){apply(\"happ\");});",
    );
    html.push_str(&format!(
        "setTimeout(function(){{window.location.href=apps[selected].link;}},{DEEP_LINK_DELAY_MS});}})();</script></body></html>"
    ));
    html
}

/// Fallback when no Happ link is on file: post the subscription URL to the
/// generator endpoint.
pub fn happ_fallback_page(params: &PageParams<'_>, config: &ImportConfig) -> String {
    let mut html = head(&format!("{} - Happ", config.brand), "body{font-family:system-ui;padding:16px}");
    html.push_str(&format!(
        "<p>Opening Happ import.</p>\
         <form id=\"happgen\" method=\"POST\" action=\"{action}\">\
         <input type=\"hidden\" name=\"url\" value=\"{sub_url}\">\
         <button type=\"submit\">Open Happ generator</button></form>\
         <script>(function(){{setTimeout(function(){{var f=document.getElementById('happgen');if(f){{f.submit();}}}},{GENERATOR_SUBMIT_DELAY_MS});}})();</script>\
         </body></html>",
        action = escape_html(&config.happ_generator_url),
        sub_url = escape_html(params.sub_url),
    ));
    html
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> PageParams<'static> {
        PageParams {
            sub_url: "https://vpn.example:8443/sub/alice",
            host: "vpn.example:8443",
            alias: "alice",
        }
    }

    #[test]
    fn test_deep_link() {
        assert_eq!(
            deep_link("v2raytun", "https://h/sub/a"),
            "v2raytun://import/https://h/sub/a"
        );
        assert_eq!(params().happ_launch_url(), "https://vpn.example:8443/i/alice/happ");
    }

    #[test]
    fn test_menu_page_embeds_links() {
        let config = ImportConfig::default();
        let html = menu_page(&params(), &config);

        assert!(html.starts_with("<!doctype html>"));
        assert!(html.contains("\"subUrl\":\"https://vpn.example:8443/sub/alice\""));
        assert!(html.contains("v2raytun://import/https://vpn.example:8443/sub/alice"));
        assert!(html.contains("https://vpn.example:8443/i/alice/happ"));
        assert!(html.contains(&config.stores.happ_windows));
        assert!(html.contains("URLSearchParams"));
    }

    #[test]
    fn test_menu_platform_override_only_accepts_own_keys() {
        let html = menu_page(&params(), &ImportConfig::default());
        assert!(html.contains("Object.prototype.hasOwnProperty.call(cfg.apps,qp)"));
        assert!(!html.contains("cfg.apps[qp]"));
    }

    #[test]
    fn test_mobile_pages_use_platform_stores() {
        let config = ImportConfig::default();
        let ios = mobile_page(MobilePlatform::Ios, &params(), &config);
        let android = mobile_page(MobilePlatform::Android, &params(), &config);

        assert!(ios.contains("<title>HexenKVN - iOS</title>"));
        assert!(ios.contains(&config.stores.v2raytun_ios));
        assert!(!ios.contains(&config.stores.v2raytun_android));
        assert!(android.contains(&config.stores.happ_android));
        assert!(android.contains("href=\"v2raytun://import/https://vpn.example:8443/sub/alice\""));
        assert!(android.contains("},140);"));
    }

    #[test]
    fn test_happ_fallback_posts_to_generator() {
        let html = happ_fallback_page(&params(), &ImportConfig::default());
        assert!(html.contains("action=\"https://crypto.happ.su/\""));
        assert!(html.contains("value=\"https://vpn.example:8443/sub/alice\""));
        assert!(html.contains("f.submit()"));
    }

    #[test]
    fn test_request_values_are_escaped() {
        let hostile = PageParams {
            sub_url: "https://x\"><script>alert(1)</script>/sub/a",
            host: "x\"><script>alert(1)</script>",
            alias: "a",
        };
        let config = ImportConfig::default();

        for html in [
            menu_page(&hostile, &config),
            mobile_page(MobilePlatform::Ios, &hostile, &config),
            happ_fallback_page(&hostile, &config),
        ] {
            assert!(!html.contains("<script>alert(1)"), "{html}");
        }
    }
}
