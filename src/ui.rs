use crate::analytics::{analyze_all, filter_products};
use crate::model::{AnalyzedProduct, Cluster, ProductRecord};
use crate::{loader, report};
use chrono::Local;
use eframe::egui;
use egui::{
    Color32, Context, FontFamily, FontId, Margin, RichText, Visuals, Stroke, Vec2
};
use egui_extras::{Column, TableBuilder};
use egui_plot::{Bar, BarChart, Plot};

const DB_PATH: &str = "inventory.db";
const TOP_PROFIT_COUNT: usize = 10;

pub fn set_custom_style(ctx: &Context) {
    // Dark slate dashboard theme with teal accents
    let mut visuals = Visuals::dark();

    visuals.panel_fill = Color32::from_rgb(15, 20, 25);          // deep slate panel
    visuals.window_fill = Color32::from_rgb(20, 27, 34);         // window background
    visuals.extreme_bg_color = Color32::from_rgb(30, 41, 51);    // hover highlight
    visuals.faint_bg_color = Color32::from_rgb(25, 34, 43);      // subtle background

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(33, 44, 55);
    visuals.widgets.inactive.bg_stroke = Stroke::new(1.0, Color32::from_rgb(50, 70, 85));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(40, 58, 72);
    visuals.widgets.hovered.bg_stroke = Stroke::new(2.0, Color32::from_rgb(45, 160, 170));

    visuals.widgets.active.bg_fill = Color32::from_rgb(45, 70, 88);
    visuals.widgets.active.bg_stroke = Stroke::new(2.0, Color32::from_rgb(60, 210, 220));

    visuals.selection.bg_fill = Color32::from_rgb(35, 75, 90);
    visuals.selection.stroke = Stroke::new(1.0, Color32::from_rgb(80, 220, 230));

    ctx.set_visuals(visuals);

    let mut style = (*ctx.style()).clone();

    style.spacing.item_spacing = egui::vec2(8.0, 6.0);
    style.spacing.window_margin = Margin::same(12);
    style.spacing.button_padding = egui::vec2(12.0, 8.0);
    style.spacing.indent = 16.0;

    style.text_styles.insert(
        egui::TextStyle::Body,
        FontId::new(15.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Heading,
        FontId::new(22.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Button,
        FontId::new(15.0, FontFamily::Proportional),
    );
    style.text_styles.insert(
        egui::TextStyle::Monospace,
        FontId::new(14.0, FontFamily::Monospace),
    );

    ctx.set_style(style);
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum SortBy {
    LoadOrder,
    Score,
    Profit,
    Name,
}

pub struct AnalyzerApp {
    loaded: bool,
    products: Vec<AnalyzedProduct>,
    filtered: Vec<AnalyzedProduct>,

    // Filters
    search: String,
    selected_cluster: Option<Cluster>,
    near_expiry_only: bool,
    sort_by: SortBy,

    // Actions
    import_path: String,

    // UI state
    selected_row: Option<usize>,
}

impl AnalyzerApp {
    pub fn new() -> Self {
        Self {
            loaded: false,
            products: vec![],
            filtered: vec![],

            search: "".into(),
            selected_cluster: None,
            near_expiry_only: false,
            sort_by: SortBy::LoadOrder,

            import_path: "".into(),

            selected_row: None,
        }
    }

    fn load_data(&mut self) {
        let records = match loader::load_products(DB_PATH) {
            Ok(v) => v,
            Err(err) => {
                // Keep the previous (or empty) list; no retry.
                tracing::error!(error = %err, db = DB_PATH, "product table load failed");
                return;
            }
        };
        self.set_records(records);
    }

    fn import_json(&mut self) {
        let path = self.import_path.trim().to_string();
        if path.is_empty() {
            return;
        }
        match loader::load_products_json(&path) {
            Ok(records) => self.set_records(records),
            Err(err) => {
                tracing::error!(error = %err, path = %path, "json import failed");
            }
        }
    }

    fn set_records(&mut self, records: Vec<ProductRecord>) {
        let today = Local::now().date_naive();
        self.products = analyze_all(&records, today);
        tracing::info!(products = self.products.len(), "analysis pass complete");
        self.apply_filters();
        self.loaded = true;
    }

    fn export_csv(&self) {
        match report::write_csv(&self.filtered, report::EXPORT_FILE) {
            Ok(()) => {
                tracing::info!(
                    rows = self.filtered.len(),
                    file = report::EXPORT_FILE,
                    "report written"
                );
            }
            Err(err) => tracing::error!(error = %err, "report export failed"),
        }
    }

    fn apply_filters(&mut self) {
        let mut filtered =
            filter_products(&self.products, &self.search, self.selected_cluster);

        if self.near_expiry_only {
            filtered.retain(|p| p.close_to_expiry);
        }

        match self.sort_by {
            SortBy::LoadOrder => {}
            SortBy::Score => filtered.sort_by(|a, b| {
                b.performance_score
                    .partial_cmp(&a.performance_score)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortBy::Profit => filtered.sort_by(|a, b| {
                b.profit
                    .partial_cmp(&a.profit)
                    .unwrap_or(std::cmp::Ordering::Equal)
            }),
            SortBy::Name => filtered.sort_by(|a, b| a.record.name.cmp(&b.record.name)),
        }

        self.selected_row = None;
        self.filtered = filtered;
    }

    fn cluster_color(cluster: Cluster) -> Color32 {
        match cluster {
            Cluster::High => Color32::from_rgb(16, 185, 129),
            Cluster::Moderate => Color32::from_rgb(245, 158, 11),
            Cluster::Low => Color32::from_rgb(239, 68, 68),
        }
    }

    fn cluster_badge(ui: &mut egui::Ui, cluster: Cluster) {
        let (icon, text) = match cluster {
            Cluster::High => ("▲", "High"),
            Cluster::Moderate => ("●", "Moderate"),
            Cluster::Low => ("▼", "Low"),
        };
        let color = Self::cluster_color(cluster);
        ui.horizontal(|ui| {
            ui.label(RichText::new(icon).size(16.0).color(color));
            ui.label(RichText::new(text).color(color).small());
        });
    }

    fn summary_card(ui: &mut egui::Ui, title: &str, value: String, color: Color32) {
        egui::Frame::new()
            .fill(Color32::from_rgb(25, 34, 43))
            .stroke(Stroke::new(1.0, Color32::from_rgb(50, 70, 85)))
            .inner_margin(Margin::same(12))
            .show(ui, |ui| {
                ui.set_min_width(180.0);
                ui.vertical(|ui| {
                    ui.label(
                        RichText::new(title)
                            .color(Color32::from_rgb(140, 160, 175))
                            .small(),
                    );
                    ui.label(RichText::new(value).color(color).strong().size(26.0));
                });
            });
    }

    fn cluster_chart(&self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new("Performance Clusters")
                .color(Color32::from_rgb(160, 190, 205))
                .strong(),
        );
        let summary = report::summarize(&self.filtered);
        let bars: Vec<Bar> = Cluster::ALL
            .iter()
            .map(|&c| {
                Bar::new(f64::from(c.id()), summary.count(c) as f64)
                    .width(0.6)
                    .fill(Self::cluster_color(c))
                    .name(c.label())
            })
            .collect();

        Plot::new("cluster_distribution")
            .height(220.0)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new("clusters", bars));
            });
    }

    fn profit_chart(&self, ui: &mut egui::Ui) {
        ui.label(
            RichText::new(format!("Top {TOP_PROFIT_COUNT} Products by Profit"))
                .color(Color32::from_rgb(160, 190, 205))
                .strong(),
        );
        let bars: Vec<Bar> = report::top_by_profit(&self.filtered, TOP_PROFIT_COUNT)
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let short: String = p.record.name.chars().take(15).collect();
                Bar::new(i as f64, p.profit)
                    .width(0.6)
                    .fill(Color32::from_rgb(59, 130, 246))
                    .name(short)
            })
            .collect();

        Plot::new("top_profit")
            .height(220.0)
            .allow_drag(false)
            .allow_zoom(false)
            .allow_scroll(false)
            .show(ui, |plot_ui| {
                plot_ui.bar_chart(BarChart::new("profit", bars));
            });
    }
}

impl eframe::App for AnalyzerApp {
    fn update(&mut self, ctx: &Context, _frame: &mut eframe::Frame) {
        egui::TopBottomPanel::top("top").show(ctx, |ui| {
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                ui.heading(
                    RichText::new("🛒 Smart Inventory Analyzer")
                        .color(Color32::from_rgb(80, 220, 230))
                        .strong()
                        .size(24.0),
                );
            });

            ui.add_space(4.0);
            ui.separator();
            ui.add_space(4.0);

            ui.horizontal(|ui| {
                if ui
                    .add_sized(
                        Vec2::new(130.0, 32.0),
                        egui::Button::new(
                            RichText::new("🔍 Analyze Inventory")
                                .color(Color32::from_rgb(120, 230, 235))
                                .strong(),
                        ),
                    )
                    .clicked()
                {
                    self.load_data();
                }

                ui.separator();

                // JSON bulk import
                ui.add(
                    egui::TextEdit::singleline(&mut self.import_path)
                        .hint_text("products.json")
                        .desired_width(180.0),
                );
                if ui.button("📂 Import JSON").clicked() {
                    self.import_json();
                }

                ui.separator();

                if ui.button("📥 Download Report").clicked() {
                    self.export_csv();
                }

                ui.separator();

                ui.label(RichText::new("🔎").color(Color32::from_rgb(140, 190, 200)));
                let search_response = ui.add(
                    egui::TextEdit::singleline(&mut self.search)
                        .hint_text("Search products or categories...")
                        .desired_width(220.0),
                );
                if search_response.changed() && self.loaded {
                    self.apply_filters();
                }
            });

            ui.add_space(2.0);
        });

        if self.loaded {
            egui::SidePanel::right("filters")
                .min_width(230.0)
                .max_width(320.0)
                .show(ctx, |ui| {
                    ui.heading(
                        RichText::new("⚡ Filters")
                            .color(Color32::from_rgb(80, 220, 230)),
                    );

                    ui.separator();

                    egui::ScrollArea::vertical().show(ui, |ui| {
                        ui.label(RichText::new("🏷 Cluster").strong());
                        ui.horizontal_wrapped(|ui| {
                            for cluster in Cluster::ALL {
                                let is_selected = self.selected_cluster == Some(cluster);
                                let col = Self::cluster_color(cluster);

                                if ui
                                    .selectable_label(
                                        is_selected,
                                        RichText::new(format!(
                                            "Cluster {} – {}",
                                            cluster.id(),
                                            cluster.label()
                                        ))
                                        .color(col),
                                    )
                                    .clicked()
                                {
                                    self.selected_cluster =
                                        if is_selected { None } else { Some(cluster) };
                                    self.apply_filters();
                                }
                            }
                        });

                        if self.selected_cluster.is_some()
                            && ui.button("Clear Cluster Filter").clicked()
                        {
                            self.selected_cluster = None;
                            self.apply_filters();
                        }

                        ui.add_space(10.0);
                        ui.separator();

                        if ui
                            .checkbox(&mut self.near_expiry_only, "⚠ Near Expiry Only")
                            .changed()
                        {
                            self.apply_filters();
                        }

                        ui.add_space(10.0);
                        ui.separator();

                        ui.label(RichText::new("📊 Sort By").strong());
                        egui::ComboBox::from_id_salt("sort_by")
                            .selected_text(format!("{:?}", self.sort_by))
                            .show_ui(ui, |ui| {
                                let sorts = [
                                    SortBy::LoadOrder,
                                    SortBy::Score,
                                    SortBy::Profit,
                                    SortBy::Name,
                                ];
                                for sort in sorts {
                                    if ui
                                        .selectable_value(
                                            &mut self.sort_by,
                                            sort,
                                            format!("{sort:?}"),
                                        )
                                        .clicked()
                                    {
                                        self.apply_filters();
                                    }
                                }
                            });

                        ui.add_space(10.0);
                        ui.separator();

                        if ui
                            .button(
                                RichText::new("🔄 Reset All Filters")
                                    .color(Color32::from_rgb(255, 150, 150)),
                            )
                            .clicked()
                        {
                            self.search.clear();
                            self.selected_cluster = None;
                            self.near_expiry_only = false;
                            self.sort_by = SortBy::LoadOrder;
                            self.apply_filters();
                        }
                    });
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.loaded {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.add_space(100.0);
                        ui.label(
                            RichText::new("🛒")
                                .size(80.0)
                                .color(Color32::from_rgb(80, 220, 230)),
                        );
                        ui.add_space(20.0);
                        ui.label(
                            RichText::new("Welcome to the Smart Inventory Analyzer")
                                .size(24.0)
                                .color(Color32::from_rgb(170, 195, 210)),
                        );
                        ui.add_space(10.0);
                        ui.label(
                            RichText::new(
                                "Click 'Analyze Inventory' to score the product table",
                            )
                            .color(Color32::from_rgb(130, 155, 170)),
                        );
                    });
                });
                return;
            }

            let summary = report::summarize(&self.filtered);
            let stats = report::summary_stats(&self.filtered);

            ui.horizontal(|ui| {
                Self::summary_card(
                    ui,
                    "Total Products Analyzed",
                    summary.total.to_string(),
                    Color32::from_rgb(200, 220, 230),
                );
                Self::summary_card(
                    ui,
                    "High Performers",
                    summary.high.to_string(),
                    Self::cluster_color(Cluster::High),
                );
                Self::summary_card(
                    ui,
                    "Needs Attention",
                    summary.low.to_string(),
                    Self::cluster_color(Cluster::Low),
                );
            });

            ui.add_space(4.0);
            ui.label(
                RichText::new(format!(
                    "Avg conversion {:.1}%  •  Avg profit ₹{:.0}  •  {} near expiry",
                    stats.mean_conversion * 100.0,
                    stats.mean_profit,
                    stats.near_expiry
                ))
                .color(Color32::from_rgb(130, 155, 170)),
            );

            ui.add_space(6.0);
            ui.columns(2, |cols| {
                self.cluster_chart(&mut cols[0]);
                self.profit_chart(&mut cols[1]);
            });
            ui.add_space(6.0);
            ui.separator();

            if self.filtered.is_empty() {
                ui.centered_and_justified(|ui| {
                    ui.vertical_centered(|ui| {
                        ui.label(
                            RichText::new("🔍")
                                .size(60.0)
                                .color(Color32::from_rgb(100, 125, 140)),
                        );
                        ui.add_space(10.0);
                        ui.label(
                            RichText::new("No products match your filters")
                                .size(20.0)
                                .color(Color32::from_rgb(170, 195, 210)),
                        );
                        ui.add_space(5.0);
                        ui.label(
                            RichText::new("Try adjusting your search or filter settings")
                                .color(Color32::from_rgb(130, 155, 170)),
                        );
                    });
                });
                return;
            }

            ui.style_mut().visuals.extreme_bg_color = Color32::from_rgb(30, 41, 51);

            TableBuilder::new(ui)
                .striped(true)
                .vscroll(true)
                .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
                .column(Column::remainder().at_least(160.0).clip(true)) // Product
                .column(Column::exact(110.0)) // Category
                .column(Column::exact(80.0))  // Price
                .column(Column::exact(110.0)) // Cluster
                .column(Column::exact(75.0))  // Score
                .column(Column::exact(95.0))  // Conversion
                .column(Column::exact(70.0))  // Stock
                .column(Column::exact(95.0))  // Profit
                .column(Column::exact(95.0))  // Safe discount
                .column(Column::exact(70.0))  // Expiry
                .header(32.0, |mut header| {
                    let header_color = Color32::from_rgb(160, 190, 205);
                    for title in [
                        "Product",
                        "Category",
                        "Price",
                        "Cluster",
                        "Score",
                        "Conversion",
                        "Stock",
                        "Profit",
                        "Safe Disc.",
                        "Expiry",
                    ] {
                        header.col(|ui| {
                            ui.heading(RichText::new(title).color(header_color));
                        });
                    }
                })
                .body(|body| {
                    body.rows(36.0, self.filtered.len(), |mut row| {
                        let i = row.index();
                        let p = &self.filtered[i];
                        let is_selected = self.selected_row == Some(i);

                        let mut clicked = false;

                        row.col(|ui| {
                            let mut text = RichText::new(&p.record.name);
                            if is_selected {
                                text = text.color(Color32::from_rgb(120, 230, 235)).strong();
                            }
                            if ui.selectable_label(is_selected, text).clicked() {
                                clicked = true;
                            }
                        });

                        row.col(|ui| {
                            ui.label(
                                RichText::new(&p.record.category)
                                    .color(Color32::from_rgb(150, 170, 185)),
                            );
                        });

                        row.col(|ui| {
                            ui.label(
                                RichText::new(format!("₹{:.2}", p.record.price))
                                    .color(Color32::from_rgb(180, 200, 255)),
                            );
                        });

                        row.col(|ui| {
                            Self::cluster_badge(ui, p.cluster);
                        });

                        row.col(|ui| {
                            let score_color = match p.cluster {
                                Cluster::High => Color32::from_rgb(100, 255, 150),
                                Cluster::Moderate => Color32::from_rgb(255, 210, 100),
                                Cluster::Low => Color32::from_rgb(255, 120, 120),
                            };
                            ui.label(
                                RichText::new(format!("{:.2}", p.performance_score))
                                    .color(score_color)
                                    .strong(),
                            );
                        });

                        row.col(|ui| {
                            ui.label(
                                RichText::new(format!("{:.1}%", p.conversion_rate * 100.0))
                                    .color(Color32::from_rgb(180, 220, 200)),
                            );
                        });

                        row.col(|ui| {
                            let stock_color = if p.record.stock_count < 10 {
                                Color32::from_rgb(255, 150, 120)
                            } else {
                                Color32::from_rgb(200, 200, 200)
                            };
                            ui.label(
                                RichText::new(p.record.stock_count.to_string())
                                    .color(stock_color),
                            );
                        });

                        row.col(|ui| {
                            let profit_color = if p.profit > 1000.0 {
                                Color32::from_rgb(100, 255, 150)
                            } else if p.profit > 0.0 {
                                Color32::from_rgb(190, 235, 200)
                            } else {
                                Color32::from_rgb(255, 120, 120)
                            };
                            ui.label(
                                RichText::new(format!("₹{:.0}", p.profit))
                                    .color(profit_color)
                                    .strong(),
                            );
                        });

                        row.col(|ui| {
                            ui.label(
                                RichText::new(format!(
                                    "{:.0}%",
                                    p.predicted_safe_discount * 100.0
                                ))
                                .color(Color32::from_rgb(200, 180, 255)),
                            );
                        });

                        row.col(|ui| {
                            if p.close_to_expiry {
                                ui.label(
                                    RichText::new("⚠ soon")
                                        .color(Color32::from_rgb(255, 150, 120))
                                        .small(),
                                );
                            }
                        });

                        if clicked {
                            self.selected_row = if is_selected { None } else { Some(i) };
                        }
                    });
                });

            if let Some(idx) = self.selected_row {
                if let Some(p) = self.filtered.get(idx) {
                    ui.add_space(10.0);
                    ui.separator();

                    egui::Frame::new()
                        .fill(Color32::from_rgb(25, 34, 43))
                        .stroke(Stroke::new(2.0, Color32::from_rgb(50, 90, 105)))
                        .inner_margin(Margin::same(12))
                        .show(ui, |ui| {
                            ui.horizontal(|ui| {
                                ui.label(
                                    RichText::new(&p.record.name)
                                        .color(Color32::from_rgb(120, 230, 235))
                                        .strong()
                                        .size(16.0),
                                );
                                ui.label(
                                    RichText::new(p.management_tip)
                                        .color(Self::cluster_color(p.cluster)),
                                );
                            });
                            ui.label(
                                RichText::new(&p.smart_suggestions)
                                    .color(Color32::from_rgb(170, 195, 210))
                                    .italics(),
                            );
                            ui.label(
                                RichText::new(format!(
                                    "Abandon rate {:.1}%  •  Safe discount {:.0}%",
                                    p.abandon_rate * 100.0,
                                    p.predicted_safe_discount * 100.0
                                ))
                                .color(Color32::from_rgb(130, 155, 170))
                                .small(),
                            );
                        });
                }
            }
        });

        ctx.request_repaint();
    }
}
