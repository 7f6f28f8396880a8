// ABOUTME: HTML email templates with merge-data rendering
// ABOUTME: Welcome, password reset, weather alert, market update, and custom bodies
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 SmartAgriNet

//! Email templates
//!
//! Each template renders a fixed HTML document from its merge data. The
//! subject line is part of the template; callers pick a template and hand
//! it to the dispatcher.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

/// Merge data for a weather alert email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherAlertData {
    /// Alert category (storm, drought, frost, ...)
    pub alert_type: String,
    /// Affected location description
    pub location: String,
    /// When the event starts
    pub time: String,
    /// Expected duration
    pub duration: String,
    /// Alert details
    pub description: String,
    /// Recommended actions, one bullet each
    pub recommendations: Vec<String>,
}

/// One product row of a market update email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketProduct {
    /// Product name
    pub name: String,
    /// Current price, formatted
    pub current_price: String,
    /// Percent change since the last update
    pub change: f64,
    /// Trend description
    pub trend: String,
}

/// Merge data for a market update email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketUpdateData {
    /// Update date, formatted
    pub date: String,
    /// Market name
    pub market_name: String,
    /// Market location
    pub location: String,
    /// Price rows
    pub products: Vec<MarketProduct>,
    /// Insight bullets
    pub insights: Vec<String>,
    /// Selling-window advice
    pub best_time_to_sell: String,
}

/// A selectable email template with its merge data
#[derive(Debug, Clone)]
pub enum EmailTemplate {
    /// Sent after successful registration
    Welcome {
        /// Recipient's first name
        first_name: String,
        /// Interface language code
        language: String,
    },
    /// Sent with a password-reset link
    PasswordReset {
        /// One-time reset link
        reset_link: String,
        /// Interface language code
        language: String,
    },
    /// Sent when a weather alert affects the recipient's farm
    WeatherAlert {
        /// Alert merge data
        alert: WeatherAlertData,
        /// Interface language code
        language: String,
    },
    /// Sent with market price movements
    MarketUpdate {
        /// Market merge data
        market: MarketUpdateData,
        /// Interface language code
        language: String,
    },
    /// Free-form content wrapped in the standard layout
    Custom {
        /// Subject line
        subject: String,
        /// Inner HTML content
        content: String,
        /// Interface language code
        language: String,
    },
}

/// A rendered email ready for the transport
#[derive(Debug, Clone)]
pub struct RenderedEmail {
    /// Subject line
    pub subject: String,
    /// HTML body
    pub html: String,
}

const FOOTER: &str = "<div class=\"footer\">\
<p>&copy; 2024 SmartAgriNet. All rights reserved.</p>\
<p>If you have any questions, contact us at support@smartagrinet.com</p>\
</div>";

fn layout(language: &str, title: &str, header_html: &str, content_html: &str) -> String {
    format!(
        "<!DOCTYPE html>\
<html lang=\"{language}\">\
<head>\
<meta charset=\"UTF-8\">\
<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\
<title>{title}</title>\
<style>\
body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}\
.container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}\
.header {{ background: linear-gradient(135deg, #2E7D32, #4CAF50); color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }}\
.content {{ background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }}\
.button {{ display: inline-block; background: #4CAF50; color: white; padding: 12px 24px; text-decoration: none; border-radius: 5px; margin: 20px 0; }}\
.warning {{ background: #fff3cd; border: 1px solid #ffeaa7; padding: 15px; border-radius: 5px; margin: 20px 0; }}\
.price-table {{ width: 100%; border-collapse: collapse; margin: 20px 0; }}\
.price-table th, .price-table td {{ border: 1px solid #ddd; padding: 12px; text-align: left; }}\
.price-table th {{ background-color: #4CAF50; color: white; }}\
.increase {{ color: #4CAF50; font-weight: bold; }}\
.decrease {{ color: #f44336; font-weight: bold; }}\
.footer {{ text-align: center; margin-top: 30px; color: #666; font-size: 14px; }}\
</style>\
</head>\
<body>\
<div class=\"container\">\
<div class=\"header\">{header_html}</div>\
<div class=\"content\">{content_html}</div>\
{FOOTER}\
</div>\
</body>\
</html>"
    )
}

fn bullet_list(items: &[String]) -> String {
    let mut out = String::new();
    for item in items {
        let _ = write!(out, "<li>{item}</li>");
    }
    out
}

impl EmailTemplate {
    /// Renders the template to a subject and HTML body
    ///
    /// `frontend_url` is merged into templates that link back to the app.
    #[must_use]
    pub fn render(&self, frontend_url: &str) -> RenderedEmail {
        match self {
            Self::Welcome {
                first_name,
                language,
            } => RenderedEmail {
                subject: "Welcome to SmartAgriNet - Your Smart Farming Journey Begins!".to_owned(),
                html: layout(
                    language,
                    "Welcome to SmartAgriNet",
                    "<h1>Welcome to SmartAgriNet!</h1>\
                     <p>Empowering African Farmers with Smart Technology</p>",
                    &format!(
                        "<h2>Hello {first_name}!</h2>\
                         <p>Welcome to SmartAgriNet - your comprehensive smart agriculture \
                         platform designed specifically for African farmers.</p>\
                         <h3>What you can do with SmartAgriNet:</h3>\
                         <ul>\
                         <li><strong>AI-Powered Crop Recommendations</strong> - Get personalized crop suggestions based on your soil and weather</li>\
                         <li><strong>Pest Detection</strong> - Identify pests and diseases using your phone's camera</li>\
                         <li><strong>Smart Irrigation</strong> - Optimize water usage with automated irrigation planning</li>\
                         <li><strong>Marketplace</strong> - Buy and sell agricultural products directly</li>\
                         <li><strong>Weather Forecasting</strong> - Get accurate weather predictions for your farm</li>\
                         </ul>\
                         <a href=\"{frontend_url}/dashboard\" class=\"button\">Get Started Now</a>\
                         <h3>Quick Tips:</h3>\
                         <ul>\
                         <li>Add your farm location for accurate weather data</li>\
                         <li>Take photos of your crops for pest detection</li>\
                         <li>Check the marketplace for best prices</li>\
                         </ul>"
                    ),
                ),
            },
            Self::PasswordReset {
                reset_link,
                language,
            } => RenderedEmail {
                subject: "Reset Your SmartAgriNet Password".to_owned(),
                html: layout(
                    language,
                    "Password Reset - SmartAgriNet",
                    "<h1>Password Reset Request</h1>\
                     <p>SmartAgriNet Account Security</p>",
                    &format!(
                        "<h2>Password Reset Request</h2>\
                         <p>We received a request to reset your SmartAgriNet account password.</p>\
                         <a href=\"{reset_link}\" class=\"button\">Reset Password</a>\
                         <div class=\"warning\">\
                         <strong>Security Notice:</strong>\
                         <ul>\
                         <li>This link will expire in 1 hour</li>\
                         <li>If you didn't request this, please ignore this email</li>\
                         <li>Never share your password with anyone</li>\
                         </ul>\
                         </div>\
                         <p>If the button doesn't work, copy and paste this link into your browser:</p>\
                         <p style=\"word-break: break-all; color: #666;\">{reset_link}</p>"
                    ),
                ),
            },
            Self::WeatherAlert { alert, language } => RenderedEmail {
                subject: "Weather Alert for Your Farm".to_owned(),
                html: layout(
                    language,
                    "Weather Alert - SmartAgriNet",
                    "<h1>Weather Alert</h1>\
                     <p>Important weather information for your farm</p>",
                    &format!(
                        "<h2>Weather Alert: {}</h2>\
                         <p><strong>Location:</strong> {}</p>\
                         <p><strong>Time:</strong> {}</p>\
                         <p><strong>Duration:</strong> {}</p>\
                         <div class=\"warning\"><h3>Alert Details:</h3><p>{}</p></div>\
                         <h3>Recommended Actions:</h3>\
                         <ul>{}</ul>\
                         <p><strong>Stay safe and protect your crops!</strong></p>",
                        alert.alert_type,
                        alert.location,
                        alert.time,
                        alert.duration,
                        alert.description,
                        bullet_list(&alert.recommendations),
                    ),
                ),
            },
            Self::MarketUpdate { market, language } => {
                let mut rows = String::new();
                for product in &market.products {
                    let class = if product.change > 0.0 {
                        "increase"
                    } else {
                        "decrease"
                    };
                    let sign = if product.change > 0.0 { "+" } else { "" };
                    let _ = write!(
                        rows,
                        "<tr><td>{}</td><td>{}</td><td class=\"{class}\">{sign}{}%</td><td>{}</td></tr>",
                        product.name, product.current_price, product.change, product.trend,
                    );
                }
                RenderedEmail {
                    subject: "Market Price Update - SmartAgriNet".to_owned(),
                    html: layout(
                        language,
                        "Market Update - SmartAgriNet",
                        "<h1>Market Price Update</h1>\
                         <p>Latest prices for your agricultural products</p>",
                        &format!(
                            "<h2>Market Update: {}</h2>\
                             <p><strong>Market:</strong> {}</p>\
                             <p><strong>Location:</strong> {}</p>\
                             <h3>Price Changes:</h3>\
                             <table class=\"price-table\">\
                             <thead><tr><th>Product</th><th>Current Price</th><th>Change</th><th>Trend</th></tr></thead>\
                             <tbody>{rows}</tbody>\
                             </table>\
                             <h3>Market Insights:</h3>\
                             <ul>{}</ul>\
                             <p><strong>Best time to sell:</strong> {}</p>",
                            market.date,
                            market.market_name,
                            market.location,
                            bullet_list(&market.insights),
                            market.best_time_to_sell,
                        ),
                    ),
                }
            }
            Self::Custom {
                subject,
                content,
                language,
            } => RenderedEmail {
                subject: subject.clone(),
                html: layout(
                    language,
                    "SmartAgriNet",
                    "<h1>SmartAgriNet</h1><p>Empowering African Farmers</p>",
                    content,
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn welcome_merges_name_and_dashboard_link() {
        let rendered = EmailTemplate::Welcome {
            first_name: "Amina".to_owned(),
            language: "en".to_owned(),
        }
        .render("https://app.smartagrinet.com");

        assert!(rendered.subject.contains("Welcome"));
        assert!(rendered.html.contains("Hello Amina!"));
        assert!(rendered
            .html
            .contains("https://app.smartagrinet.com/dashboard"));
        assert!(rendered.html.contains("lang=\"en\""));
    }

    #[test]
    fn password_reset_embeds_link_twice() {
        let rendered = EmailTemplate::PasswordReset {
            reset_link: "https://id.example.com/reset?oob=abc".to_owned(),
            language: "fr".to_owned(),
        }
        .render("https://app.smartagrinet.com");

        assert_eq!(rendered.html.matches("https://id.example.com/reset?oob=abc").count(), 2);
    }

    #[test]
    fn market_update_marks_price_direction() {
        let rendered = EmailTemplate::MarketUpdate {
            market: MarketUpdateData {
                date: "2024-06-01".to_owned(),
                market_name: "Mile 12".to_owned(),
                location: "Lagos".to_owned(),
                products: vec![
                    MarketProduct {
                        name: "Maize".to_owned(),
                        current_price: "₦450/kg".to_owned(),
                        change: 4.2,
                        trend: "rising".to_owned(),
                    },
                    MarketProduct {
                        name: "Cassava".to_owned(),
                        current_price: "₦180/kg".to_owned(),
                        change: -2.0,
                        trend: "falling".to_owned(),
                    },
                ],
                insights: vec!["Maize demand up ahead of festivities".to_owned()],
                best_time_to_sell: "This week".to_owned(),
            },
            language: "en".to_owned(),
        }
        .render("https://app.smartagrinet.com");

        assert!(rendered.html.contains("class=\"increase\">+4.2%"));
        assert!(rendered.html.contains("class=\"decrease\">-2%"));
    }
}
